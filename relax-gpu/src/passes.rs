use bytemuck::{Pod, Zeroable};
use glam::{Mat4, UVec2, Vec4};

use crate::Frustum;

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct PrepassParams {
    /// 2x2 rotation matrix (`cos, sin, -sin, cos`) applied to the blur's
    /// sample pattern
    pub rotator: Vec4,
    pub frustum_right: Vec4,
    pub frustum_up: Vec4,
    pub frustum_forward: Vec4,
    pub resolution: UVec2,
    pub frame_index: u32,

    /// See: [`crate::CHECKERBOARD_OFF`]
    pub checkerboard: u32,

    /// In pixels
    pub diffuse_blur_radius: f32,

    /// In pixels, scaled by roughness
    pub specular_blur_radius: f32,

    /// In world units
    pub denoising_range: f32,

    pub units_per_meter: f32,
}

impl PrepassParams {
    pub fn frustum(&self) -> Frustum {
        Frustum::new(self.frustum_right, self.frustum_up, self.frustum_forward)
    }
}

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct ReprojectionPassParams {
    pub prev_world_to_clip: Mat4,

    /// Current camera's world-space position (`w` is unused)
    pub camera_position: Vec4,

    pub frustum_right: Vec4,
    pub frustum_up: Vec4,
    pub frustum_forward: Vec4,
    pub resolution: UVec2,

    /// When non-zero, every pixel is treated as disoccluded
    pub reset_history: u32,

    pub use_bicubic: u32,

    /// When zero, confidence textures are not read and assumed to be `1.0`
    pub use_confidence_inputs: u32,

    pub roughness_based_specular_accumulation: u32,

    /// Frame rate relative to 60 Hz, in `0.25..=4.0`; scales the caps of
    /// the responsive history
    pub framerate_scale: f32,

    /// In world units
    pub denoising_range: f32,

    /// Relative view-depth tolerance
    pub disocclusion_threshold: f32,

    /// Length of the jitter change between frames, in pixels
    pub jitter_delta: f32,

    pub specular_variance_boost: f32,
    pub specular_max_accumulated_frame_num: f32,
    pub specular_max_fast_accumulated_frame_num: f32,
    pub diffuse_max_accumulated_frame_num: f32,
    pub diffuse_max_fast_accumulated_frame_num: f32,

    /// Minimum cosine between current and previous normals for the
    /// diffuse history to be accepted
    pub reject_diffuse_history_normal_threshold: f32,
}

impl ReprojectionPassParams {
    pub fn frustum(&self) -> Frustum {
        Frustum::new(self.frustum_right, self.frustum_up, self.frustum_forward)
    }
}

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct DisocclusionFixPassParams {
    pub frustum_right: Vec4,
    pub frustum_up: Vec4,
    pub frustum_forward: Vec4,
    pub resolution: UVec2,
    pub frames_to_fix: f32,

    /// In pixels
    pub max_radius: f32,

    pub normal_power: f32,

    /// In meters (i.e. same unit as the scaled view depth)
    pub denoising_range: f32,

    pub disocclusion_threshold: f32,
    pub _pad0: f32,
}

impl DisocclusionFixPassParams {
    pub fn frustum(&self) -> Frustum {
        Frustum::new(self.frustum_right, self.frustum_up, self.frustum_forward)
    }
}

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct HistoryClampingPassParams {
    pub resolution: UVec2,
    pub color_box_sigma_scale: f32,
    pub specular_max_fast_accumulated_frame_num: f32,
    pub diffuse_max_fast_accumulated_frame_num: f32,
    pub _pad0: f32,
    pub _pad1: f32,
    pub _pad2: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct FireflyPassParams {
    pub resolution: UVec2,

    /// In meters
    pub denoising_range: f32,

    pub _pad0: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct SpatialVarianceEstimationPassParams {
    pub frustum_right: Vec4,
    pub frustum_up: Vec4,
    pub frustum_forward: Vec4,
    pub resolution: UVec2,

    /// Pixels with fewer accumulated frames than this get their variance
    /// estimated spatially
    pub history_threshold: f32,

    pub phi_normal: f32,

    /// In meters
    pub denoising_range: f32,

    pub _pad0: f32,
    pub _pad1: f32,
    pub _pad2: f32,
}

impl SpatialVarianceEstimationPassParams {
    pub fn frustum(&self) -> Frustum {
        Frustum::new(self.frustum_right, self.frustum_up, self.frustum_forward)
    }
}

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct AtrousPassParams {
    pub frustum_right: Vec4,
    pub frustum_up: Vec4,
    pub frustum_forward: Vec4,
    pub resolution: UVec2,

    /// Distance between kernel taps, in pixels (`1, 2, 4, ...`)
    pub step_size: u32,

    pub roughness_edge_stopping: u32,
    pub specular_phi_luminance: f32,
    pub diffuse_phi_luminance: f32,

    /// `-ln(min_luminance_weight)`
    pub max_luminance_relative_difference: f32,

    pub phi_normal: f32,
    pub phi_depth: f32,
    pub specular_lobe_angle_fraction: f32,

    /// In radians
    pub specular_lobe_angle_slack: f32,

    pub roughness_edge_stopping_relaxation: f32,
    pub normal_edge_stopping_relaxation: f32,
    pub luminance_edge_stopping_relaxation: f32,

    /// In meters
    pub denoising_range: f32,

    pub _pad0: f32,
}

impl AtrousPassParams {
    pub fn frustum(&self) -> Frustum {
        Frustum::new(self.frustum_right, self.frustum_up, self.frustum_forward)
    }
}

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct SplitScreenPassParams {
    pub resolution: UVec2,

    /// Fraction of the screen (from the left) showing the noisy input
    pub split_screen: f32,

    /// In world units
    pub denoising_range: f32,
}

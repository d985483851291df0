use log::warn;
use relax_gpu::{CHECKERBOARD_OFF, RELAX_MAX_HISTORY_FRAME_NUM};

use crate::Config;

/// Immutable snapshot of the denoiser's tunables, built once per denoise
/// call and shared by every stage.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    // Prepass
    /// In pixels, scaled by roughness
    pub specular_blur_radius: f32,
    /// In pixels
    pub diffuse_blur_radius: f32,
    pub checkerboard: Checkerboard,

    // Reprojection
    pub specular_max_accumulated_frame_num: u32,
    pub specular_max_fast_accumulated_frame_num: u32,
    pub diffuse_max_accumulated_frame_num: u32,
    pub diffuse_max_fast_accumulated_frame_num: u32,
    pub specular_variance_boost: f32,
    pub bicubic: bool,
    pub disocclusion_threshold: f32,
    pub roughness_based_specular_accumulation: bool,
    pub reject_diffuse_history_normal_threshold: f32,

    // Disocclusion fix
    pub disocclusion_fix_edge_stopping_normal_power: f32,
    /// In pixels
    pub disocclusion_fix_max_radius: f32,
    pub disocclusion_fix_num_frames_to_fix: u32,

    // History clamping
    pub history_clamping_color_box_sigma_scale: f32,

    // Firefly suppression
    pub antifirefly: bool,

    // Spatial variance estimation
    pub spatial_variance_estimation_history_threshold: u32,

    // À-trous
    pub atrous_iterations: u32,
    pub specular_phi_luminance: f32,
    pub diffuse_phi_luminance: f32,
    pub min_luminance_weight: f32,
    pub phi_normal: f32,
    pub phi_depth: f32,
    pub specular_lobe_angle_fraction: f32,
    /// In degrees
    pub specular_lobe_angle_slack: f32,
    pub roughness_edge_stopping: bool,
    pub roughness_edge_stopping_relaxation: f32,
    pub normal_edge_stopping_relaxation: f32,
    pub luminance_edge_stopping_relaxation: f32,

    // Misc
    /// Percentage of the screen, `0..=100`; zero disables the split-screen
    pub split_screen: f32,
    /// In world units
    pub denoising_range: f32,
    pub units_per_meter: f32,
}

impl Settings {
    pub const MIN_ATROUS_ITERATIONS: u32 = 2;
    pub const MAX_ATROUS_ITERATIONS: u32 = 8;

    /// Snapshots given configuration.
    ///
    /// Values are clamped once more after being read, so that a snapshot is
    /// always valid even if the registry's ranges get loosened.
    pub fn from_config(config: &Config) -> Self {
        let frames = |name: &str| config.int(name).max(0) as u32;

        Self {
            specular_blur_radius: config
                .float("relax.prepass.specular_blur_radius"),
            diffuse_blur_radius: config
                .float("relax.prepass.diffuse_blur_radius"),
            checkerboard: Checkerboard::from_index(
                config.int("relax.prepass.checkerboard"),
            ),

            specular_max_accumulated_frame_num: frames(
                "relax.reprojection.specular_max_accumulated_frame_num",
            ),
            specular_max_fast_accumulated_frame_num: frames(
                "relax.reprojection.specular_max_fast_accumulated_frame_num",
            ),
            diffuse_max_accumulated_frame_num: frames(
                "relax.reprojection.diffuse_max_accumulated_frame_num",
            ),
            diffuse_max_fast_accumulated_frame_num: frames(
                "relax.reprojection.diffuse_max_fast_accumulated_frame_num",
            ),
            specular_variance_boost: config
                .float("relax.reprojection.specular_variance_boost"),
            bicubic: config.bool("relax.reprojection.bicubic"),
            disocclusion_threshold: config
                .float("relax.reprojection.disocclusion_threshold"),
            roughness_based_specular_accumulation: config.bool(
                "relax.reprojection.roughness_based_specular_accumulation",
            ),
            reject_diffuse_history_normal_threshold: config.float(
                "relax.reprojection.reject_diffuse_history_normal_threshold",
            ),

            disocclusion_fix_edge_stopping_normal_power: config
                .float("relax.disocclusion_fix.edge_stopping_normal_power"),
            disocclusion_fix_max_radius: config
                .float("relax.disocclusion_fix.max_radius"),
            disocclusion_fix_num_frames_to_fix: frames(
                "relax.disocclusion_fix.num_frames_to_fix",
            ),

            history_clamping_color_box_sigma_scale: config
                .float("relax.history_clamping.color_box_sigma_scale"),

            antifirefly: config.bool("relax.antifirefly"),

            spatial_variance_estimation_history_threshold: frames(
                "relax.spatial_variance_estimation.history_threshold",
            ),

            atrous_iterations: frames("relax.atrous.iterations"),
            specular_phi_luminance: config
                .float("relax.atrous.specular_phi_luminance"),
            diffuse_phi_luminance: config
                .float("relax.atrous.diffuse_phi_luminance"),
            min_luminance_weight: config
                .float("relax.atrous.min_luminance_weight"),
            phi_normal: config.float("relax.atrous.phi_normal"),
            phi_depth: config.float("relax.atrous.phi_depth"),
            specular_lobe_angle_fraction: config
                .float("relax.atrous.specular_lobe_angle_fraction"),
            specular_lobe_angle_slack: config
                .float("relax.atrous.specular_lobe_angle_slack"),
            roughness_edge_stopping: config
                .bool("relax.atrous.roughness_edge_stopping"),
            roughness_edge_stopping_relaxation: config
                .float("relax.atrous.roughness_edge_stopping_relaxation"),
            normal_edge_stopping_relaxation: config
                .float("relax.atrous.normal_edge_stopping_relaxation"),
            luminance_edge_stopping_relaxation: config
                .float("relax.atrous.luminance_edge_stopping_relaxation"),

            split_screen: config.float("relax.split_screen"),
            denoising_range: config.float("relax.denoising_range"),
            units_per_meter: config.float("relax.misc.units_per_meter"),
        }
        .clamped()
    }

    /// Returns a copy of these settings with every value brought into its
    /// valid range.
    pub fn clamped(mut self) -> Self {
        fn frames(name: &str, value: &mut u32) {
            if *value > RELAX_MAX_HISTORY_FRAME_NUM {
                warn!(
                    "`{name}` = {value} exceeds the maximum history length; \
                     clamping to {RELAX_MAX_HISTORY_FRAME_NUM}"
                );

                *value = RELAX_MAX_HISTORY_FRAME_NUM;
            }
        }

        fn range(name: &str, value: &mut f32, min: f32, max: f32) {
            if value.is_nan() {
                *value = min;
            } else if *value < min || *value > max {
                let clamped = value.clamp(min, max);

                warn!(
                    "`{name}` = {value} is out of range; clamping to {clamped}"
                );

                *value = clamped;
            }
        }

        frames(
            "specular_max_accumulated_frame_num",
            &mut self.specular_max_accumulated_frame_num,
        );
        frames(
            "specular_max_fast_accumulated_frame_num",
            &mut self.specular_max_fast_accumulated_frame_num,
        );
        frames(
            "diffuse_max_accumulated_frame_num",
            &mut self.diffuse_max_accumulated_frame_num,
        );
        frames(
            "diffuse_max_fast_accumulated_frame_num",
            &mut self.diffuse_max_fast_accumulated_frame_num,
        );
        frames(
            "disocclusion_fix_num_frames_to_fix",
            &mut self.disocclusion_fix_num_frames_to_fix,
        );
        frames(
            "spatial_variance_estimation_history_threshold",
            &mut self.spatial_variance_estimation_history_threshold,
        );

        let iterations = self
            .atrous_iterations
            .clamp(Self::MIN_ATROUS_ITERATIONS, Self::MAX_ATROUS_ITERATIONS);

        if iterations != self.atrous_iterations {
            warn!(
                "`atrous_iterations` = {} is out of range; clamping to \
                 {iterations}",
                self.atrous_iterations
            );

            self.atrous_iterations = iterations;
        }

        for (name, value, min, max) in [
            (
                "specular_blur_radius",
                &mut self.specular_blur_radius,
                0.0,
                100.0,
            ),
            ("diffuse_blur_radius", &mut self.diffuse_blur_radius, 0.0, 100.0),
            (
                "specular_variance_boost",
                &mut self.specular_variance_boost,
                0.0,
                8.0,
            ),
            (
                "disocclusion_threshold",
                &mut self.disocclusion_threshold,
                0.001,
                1.0,
            ),
            (
                "reject_diffuse_history_normal_threshold",
                &mut self.reject_diffuse_history_normal_threshold,
                0.0,
                1.0,
            ),
            (
                "disocclusion_fix_edge_stopping_normal_power",
                &mut self.disocclusion_fix_edge_stopping_normal_power,
                0.0,
                128.0,
            ),
            (
                "disocclusion_fix_max_radius",
                &mut self.disocclusion_fix_max_radius,
                0.0,
                100.0,
            ),
            (
                "history_clamping_color_box_sigma_scale",
                &mut self.history_clamping_color_box_sigma_scale,
                1.0,
                10.0,
            ),
            (
                "specular_phi_luminance",
                &mut self.specular_phi_luminance,
                0.0,
                10.0,
            ),
            (
                "diffuse_phi_luminance",
                &mut self.diffuse_phi_luminance,
                0.0,
                10.0,
            ),
            ("min_luminance_weight", &mut self.min_luminance_weight, 0.0, 1.0),
            ("phi_normal", &mut self.phi_normal, 0.1, 256.0),
            ("phi_depth", &mut self.phi_depth, 0.0, 1.0),
            (
                "specular_lobe_angle_fraction",
                &mut self.specular_lobe_angle_fraction,
                0.0,
                1.0,
            ),
            (
                "specular_lobe_angle_slack",
                &mut self.specular_lobe_angle_slack,
                0.0,
                60.0,
            ),
            (
                "roughness_edge_stopping_relaxation",
                &mut self.roughness_edge_stopping_relaxation,
                0.0,
                1.0,
            ),
            (
                "normal_edge_stopping_relaxation",
                &mut self.normal_edge_stopping_relaxation,
                0.0,
                1.0,
            ),
            (
                "luminance_edge_stopping_relaxation",
                &mut self.luminance_edge_stopping_relaxation,
                0.0,
                1.0,
            ),
            ("split_screen", &mut self.split_screen, 0.0, 100.0),
            ("denoising_range", &mut self.denoising_range, 0.0, f32::MAX),
            ("units_per_meter", &mut self.units_per_meter, 0.001, f32::MAX),
        ] {
            range(name, value, min, max);
        }

        self
    }

    /// Upper bound of the à-trous luminance weight's exponent, derived from
    /// [`Self::min_luminance_weight`]; unbounded when the weight is zero.
    pub fn max_luminance_relative_difference(&self) -> f32 {
        if self.min_luminance_weight > 0.0 {
            -self.min_luminance_weight.ln()
        } else {
            f32::MAX
        }
    }

    pub fn specular_lobe_angle_slack_radians(&self) -> f32 {
        self.specular_lobe_angle_slack.to_radians()
    }

    /// Denoising range in meters, i.e. in the unit of the scaled view depth
    pub fn scaled_denoising_range(&self) -> f32 {
        self.denoising_range / self.units_per_meter
    }

    /// Fraction of the screen showing the noisy input, `0.0..=1.0`
    pub fn split_screen_fraction(&self) -> f32 {
        self.split_screen / 100.0
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            specular_blur_radius: 50.0,
            diffuse_blur_radius: 0.0,
            checkerboard: Checkerboard::Off,

            specular_max_accumulated_frame_num: 63,
            specular_max_fast_accumulated_frame_num: 4,
            diffuse_max_accumulated_frame_num: 63,
            diffuse_max_fast_accumulated_frame_num: 0,
            specular_variance_boost: 1.0,
            bicubic: true,
            disocclusion_threshold: 0.01,
            roughness_based_specular_accumulation: true,
            reject_diffuse_history_normal_threshold: 0.0,

            disocclusion_fix_edge_stopping_normal_power: 8.0,
            disocclusion_fix_max_radius: 8.0,
            disocclusion_fix_num_frames_to_fix: 3,

            history_clamping_color_box_sigma_scale: 2.0,

            antifirefly: false,

            spatial_variance_estimation_history_threshold: 3,

            atrous_iterations: 5,
            specular_phi_luminance: 2.0,
            diffuse_phi_luminance: 2.0,
            min_luminance_weight: 0.0,
            phi_normal: 64.0,
            phi_depth: 0.0001,
            specular_lobe_angle_fraction: 0.333,
            specular_lobe_angle_slack: 0.3,
            roughness_edge_stopping: true,
            roughness_edge_stopping_relaxation: 0.3,
            normal_edge_stopping_relaxation: 0.3,
            luminance_edge_stopping_relaxation: 1.0,

            split_screen: 0.0,
            denoising_range: 100000.0,
            units_per_meter: 100.0,
        }
    }
}

/// Which half of a checkerboard the inputs carry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Checkerboard {
    /// Pixels where `(x + y + frame_index)` is even
    Black,

    /// Pixels where `(x + y + frame_index)` is odd
    White,

    /// Every pixel is present
    #[default]
    Off,
}

impl Checkerboard {
    fn from_index(idx: i32) -> Self {
        match idx {
            0 => Self::Black,
            1 => Self::White,
            _ => Self::Off,
        }
    }

    pub(crate) fn as_gpu(&self) -> u32 {
        match self {
            Self::Black => 0,
            Self::White => 1,
            Self::Off => CHECKERBOARD_OFF,
        }
    }
}

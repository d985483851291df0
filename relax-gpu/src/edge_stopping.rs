//! Weights used by the spatial filters to avoid blurring across geometric
//! and lighting discontinuities.

use glam::Vec3;
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{F32Ext, RELAX_EPSILON};

/// Returns weight of a sample based on its distance from the center pixel's
/// tangent plane, relative to the center pixel's view depth.
pub fn geometry_weight(
    center_pos: Vec3,
    center_normal: Vec3,
    sample_pos: Vec3,
    center_view_z: f32,
    phi_depth: f32,
) -> f32 {
    let plane_dist = center_normal.dot(sample_pos - center_pos).abs();
    let tolerance = (phi_depth * center_view_z).max(RELAX_EPSILON);

    (-plane_dist / tolerance).exp()
}

pub fn normal_weight(center: Vec3, sample: Vec3, power: f32) -> f32 {
    center.dot(sample).max(0.0).powf(power)
}

/// Returns half-angle (in radians) of a cone containing given fraction of
/// the GGX specular lobe's energy.
pub fn specular_lobe_half_angle(roughness: f32, fraction: f32) -> f32 {
    let m = roughness * roughness;
    let fraction = fraction.clamp(0.0, 0.99);

    (m * fraction / (1.0 - fraction)).atan()
}

pub fn specular_normal_weight(
    center: Vec3,
    sample: Vec3,
    lobe_half_angle: f32,
) -> f32 {
    let angle = center.dot(sample).clamp(-1.0, 1.0).acos();

    (1.0 - angle / lobe_half_angle.max(RELAX_EPSILON)).saturate()
}

pub fn roughness_weight(center: f32, sample: f32, tolerance: f32) -> f32 {
    (1.0 - (center - sample).abs() / tolerance.max(RELAX_EPSILON)).saturate()
}

/// Returns weight of a sample based on its luminance difference from the
/// center pixel, normalized by `denominator` (derived from the local standard
/// deviation) and with the exponent clamped to `max_difference`.
pub fn luminance_weight(
    center: f32,
    sample: f32,
    denominator: f32,
    max_difference: f32,
) -> f32 {
    let diff = (center - sample).abs() / denominator.max(RELAX_EPSILON);

    (-diff.min(max_difference)).exp()
}

//! Per-pixel implementations of the denoising stages.
//!
//! Each kernel reads its inputs through [`crate::TexRead`] and returns the
//! values the pixel should write, in the same order as the stage's output
//! bindings.

mod atrous;
mod disocclusion_fix;
mod firefly;
mod history_clamping;
mod prepass;
mod reprojection;
mod spatial_variance_estimation;
mod split_screen;

pub use self::atrous::*;
pub use self::disocclusion_fix::*;
pub use self::firefly::*;
pub use self::history_clamping::*;
pub use self::prepass::*;
pub use self::reprojection::*;
pub use self::spatial_variance_estimation::*;
pub use self::split_screen::*;

/// Returns whether a pixel at given linear view depth should be denoised;
/// zero depth marks pixels without geometry.
pub fn is_in_denoising_range(view_z: f32, denoising_range: f32) -> bool {
    view_z > 0.0 && view_z <= denoising_range
}

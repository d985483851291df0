//! Common structs and per-pixel kernels used by ReLAX's shaders and by the
//! host-side reference executor.
//!
//! Every denoising stage is expressed as a plain struct with a `run()`
//! function that, given a pixel, returns what that pixel should write; the
//! shaders crate wraps those into compute entry points, while the host crate
//! can execute them directly on the CPU.

#![cfg_attr(target_arch = "spirv", no_std)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::manual_range_contains)]

mod edge_stopping;
mod frustum;
mod history_length;
mod kernels;
mod normal_roughness;
mod passes;
mod tex;
mod utils;

pub use self::edge_stopping::*;
pub use self::frustum::*;
pub use self::history_length::*;
pub use self::kernels::*;
pub use self::normal_roughness::*;
pub use self::passes::*;
pub use self::tex::*;
pub use self::utils::*;

pub mod prelude {
    pub use core::f32::consts::PI;

    #[cfg(target_arch = "spirv")]
    pub use spirv_std::glam::*;
    #[cfg(target_arch = "spirv")]
    pub use spirv_std::num_traits::Float;
    #[cfg(target_arch = "spirv")]
    pub use spirv_std::{spirv, Image};

    pub use crate::*;
}

/// Maximum number of frames a history can accumulate; history lengths are
/// stored normalized by this value.
pub const RELAX_MAX_HISTORY_FRAME_NUM: u32 = 63;

/// Golden angle, used for spatial filters.
pub const GOLDEN_ANGLE: f32 = 2.39996;

/// Golden ratio, used to rotate the pre-pass kernel each frame.
pub const GOLDEN_RATIO: f32 = 1.618034;

/// Checkerboard mode meaning "every pixel is present".
pub const CHECKERBOARD_OFF: u32 = 2;

/// Small value used to avoid divisions by zero.
pub const RELAX_EPSILON: f32 = 1.0e-6;

mod bilinear_filter;
mod catmull_rom;
mod f32_ext;
mod vec3_ext;

use core::ops;

pub use self::bilinear_filter::*;
pub use self::catmull_rom::*;
pub use self::f32_ext::*;
pub use self::vec3_ext::*;

pub fn lerp<T>(a: T, b: T, t: f32) -> T
where
    T: ops::Add<Output = T>,
    T: ops::Sub<Output = T>,
    T: ops::Mul<f32, Output = T>,
    T: Copy,
{
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Weights of the 3x3 à-trous kernel, indexed by `|dx| + |dy|`.
pub const ATROUS_KERNEL: [f32; 3] = [0.25, 0.125, 0.0625];

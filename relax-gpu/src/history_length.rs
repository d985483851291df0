use glam::{vec4, Vec4};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::RELAX_MAX_HISTORY_FRAME_NUM;

/// Number of frames accumulated by the specular and diffuse histories.
///
/// Lengths are stored normalized by [`RELAX_MAX_HISTORY_FRAME_NUM`], which
/// is what bounds the accumulation caps.
#[derive(Clone, Copy, Default)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct HistoryLength {
    pub specular: f32,
    pub diffuse: f32,
}

impl HistoryLength {
    /// Length of a pixel that has just been disoccluded.
    pub const FRESH: Self = Self {
        specular: 1.0,
        diffuse: 1.0,
    };

    pub fn new(specular: f32, diffuse: f32) -> Self {
        Self { specular, diffuse }
    }

    pub fn unpack(d0: Vec4) -> Self {
        let max = RELAX_MAX_HISTORY_FRAME_NUM as f32;

        Self {
            specular: Self::quantize(d0.x * max),
            diffuse: Self::quantize(d0.y * max),
        }
    }

    pub fn pack(self) -> Vec4 {
        let max = RELAX_MAX_HISTORY_FRAME_NUM as f32;

        vec4(
            Self::quantize(self.specular) / max,
            Self::quantize(self.diffuse) / max,
            0.0,
            0.0,
        )
    }

    pub fn min(self) -> f32 {
        self.specular.min(self.diffuse)
    }

    fn quantize(len: f32) -> f32 {
        len.round().clamp(0.0, RELAX_MAX_HISTORY_FRAME_NUM as f32)
    }
}

use glam::{Vec3, Vec4};

use crate::F32Ext;

/// World-space normal and linear roughness, stored as `normal.extend(r)`.
#[derive(Clone, Copy, Default)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct NormalRoughness {
    pub normal: Vec3,
    pub roughness: f32,
}

impl NormalRoughness {
    pub fn new(normal: Vec3, roughness: f32) -> Self {
        Self { normal, roughness }
    }

    pub fn unpack(d0: Vec4) -> Self {
        Self {
            normal: Vec3::new(d0.x, d0.y, d0.z).normalize_or_zero(),
            roughness: d0.w.saturate(),
        }
    }

    pub fn pack(self) -> Vec4 {
        self.normal.extend(self.roughness)
    }
}

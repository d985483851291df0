use glam::{vec2, vec3, Mat4, Vec2, Vec3, Vec4};

/// Camera basis in world space, with `right` and `up` premultiplied by the
/// tangents of the half field-of-view angles; lets kernels reconstruct
/// positions from linear view depth without inverting any matrices.
#[derive(Clone, Copy)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct Frustum {
    pub right: Vec3,
    pub up: Vec3,
    pub forward: Vec3,
}

impl Frustum {
    pub fn new(right: Vec4, up: Vec4, forward: Vec4) -> Self {
        Self {
            right: vec3(right.x, right.y, right.z),
            up: vec3(up.x, up.y, up.z),
            forward: vec3(forward.x, forward.y, forward.z),
        }
    }

    /// Returns the (non-normalized) direction through given uv, scaled so
    /// that its projection onto `forward` has unit length.
    pub fn ray(&self, uv: Vec2) -> Vec3 {
        let ndc = vec2(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0);

        self.forward + self.right * ndc.x + self.up * ndc.y
    }

    /// Returns camera-relative world-space position of a point seen through
    /// `uv` at given linear view depth.
    pub fn reconstruct(&self, uv: Vec2, view_z: f32) -> Vec3 {
        self.ray(uv) * view_z
    }
}

/// Projects a world-space point and returns its `(uv.x, uv.y, view_z)`;
/// non-positive `view_z` means the point is behind the camera.
pub fn project(world_to_clip: Mat4, world_pos: Vec3) -> Vec3 {
    let clip = world_to_clip * world_pos.extend(1.0);

    if clip.w <= 0.0 {
        return vec3(0.0, 0.0, clip.w);
    }

    let ndc = vec2(clip.x, clip.y) / clip.w;

    vec3(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5, clip.w)
}

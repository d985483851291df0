use glam::{Mat4, Vec2, Vec3, Vec4, Vec4Swizzles};

/// Camera the denoised frame was rendered from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub world_to_view: Mat4,

    /// Projection; assumed to look down `-Z` (i.e. right-handed, as
    /// produced by [`Mat4::perspective_rh()`])
    pub view_to_clip: Mat4,

    /// Subpixel jitter applied to the projection, in pixels
    pub jitter: Vec2,
}

impl Camera {
    pub fn new(world_to_view: Mat4, view_to_clip: Mat4) -> Self {
        Self {
            world_to_view,
            view_to_clip,
            jitter: Vec2::ZERO,
        }
    }

    pub fn with_jitter(mut self, jitter: Vec2) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn world_to_clip(&self) -> Mat4 {
        self.view_to_clip * self.world_to_view
    }

    pub fn view_to_world(&self) -> Mat4 {
        self.world_to_view.inverse()
    }

    pub fn position(&self) -> Vec3 {
        self.view_to_world().w_axis.xyz()
    }

    /// Returns world-space `right`, `up` and `forward` vectors of this
    /// camera, with `right` and `up` scaled by the tangents of the half
    /// field-of-view angles (see: [`relax_gpu::Frustum`]).
    pub fn frustum(&self) -> [Vec4; 3] {
        let view_to_world = self.view_to_world();

        let tan_x = 1.0 / self.view_to_clip.x_axis.x;
        let tan_y = 1.0 / self.view_to_clip.y_axis.y;

        let right = view_to_world.x_axis.xyz().normalize_or_zero() * tan_x;
        let up = view_to_world.y_axis.xyz().normalize_or_zero() * tan_y;
        let forward = -view_to_world.z_axis.xyz().normalize_or_zero();

        [right.extend(0.0), up.extend(0.0), forward.extend(0.0)]
    }

    /// Length of the jitter's change since `prev`, in pixels
    pub fn jitter_delta(&self, prev: &Self) -> f32 {
        (self.jitter - prev.jitter).length()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{vec2, vec3};
    use relax_gpu::{project, Frustum};

    use super::*;

    fn camera() -> Camera {
        Camera::new(
            Mat4::look_at_rh(vec3(1.0, 2.0, 3.0), vec3(1.0, 2.0, 0.0), Vec3::Y),
            Mat4::perspective_rh(60.0f32.to_radians(), 2.0, 0.1, 100.0),
        )
    }

    #[test]
    fn position() {
        let pos = camera().position();

        assert_relative_eq!(1.0, pos.x, epsilon = 1e-5);
        assert_relative_eq!(2.0, pos.y, epsilon = 1e-5);
        assert_relative_eq!(3.0, pos.z, epsilon = 1e-5);
    }

    #[test]
    fn frustum_matches_projection() {
        let camera = camera();
        let [right, up, forward] = camera.frustum();
        let frustum = Frustum::new(right, up, forward);

        for uv in [vec2(0.5, 0.5), vec2(0.1, 0.8), vec2(0.9, 0.3)] {
            let pos = camera.position() + frustum.reconstruct(uv, 7.0);
            let projected = project(camera.world_to_clip(), pos);

            assert_relative_eq!(uv.x, projected.x, epsilon = 1e-4);
            assert_relative_eq!(uv.y, projected.y, epsilon = 1e-4);
            assert_relative_eq!(7.0, projected.z, epsilon = 1e-3);
        }
    }

    #[test]
    fn jitter_delta() {
        let prev = camera().with_jitter(vec2(0.25, -0.25));
        let curr = camera().with_jitter(vec2(-0.5, 0.75));

        assert_relative_eq!(1.25, curr.jitter_delta(&prev));
        assert_eq!(0.0, curr.jitter_delta(&curr));
    }
}

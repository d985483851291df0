use glam::{ivec2, vec2, vec4, UVec2, Vec3, Vec4};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{
    geometry_weight, is_in_denoising_range, normal_weight, NormalRoughness,
    PrepassParams, Screen, TexRead, CHECKERBOARD_OFF, GOLDEN_ANGLE,
};

const SAMPLES: u32 = 8;
const PHI_DEPTH: f32 = 0.01;
const NORMAL_POWER: f32 = 8.0;

pub struct Prepass<'a, T> {
    pub params: &'a PrepassParams,
    pub specular: &'a T,
    pub diffuse: &'a T,
    pub normal_roughness: &'a T,
    pub view_z: &'a T,
}

#[derive(Clone, Copy)]
pub struct PrepassOutput {
    pub specular: Vec4,
    pub diffuse: Vec4,
    pub view_z: Vec4,
    pub scaled_view_z: Vec4,
}

impl<'a, T> Prepass<'a, T>
where
    T: TexRead,
{
    pub fn run(&self, screen_pos: UVec2) -> PrepassOutput {
        let screen = Screen::new(self.params.resolution);
        let view_z = self.view_z.load(screen_pos).x;

        let scaled_view_z = if self.params.units_per_meter > 0.0 {
            view_z / self.params.units_per_meter
        } else {
            view_z
        };

        let mut out = PrepassOutput {
            specular: self.specular.load(screen_pos),
            diffuse: self.diffuse.load(screen_pos),
            view_z: vec4(view_z, 0.0, 0.0, 0.0),
            scaled_view_z: vec4(scaled_view_z, 0.0, 0.0, 0.0),
        };

        if !is_in_denoising_range(view_z, self.params.denoising_range) {
            return out;
        }

        if !self.is_present(screen_pos) {
            out.specular =
                self.resolve_checkerboard(screen, screen_pos, self.specular);

            out.diffuse =
                self.resolve_checkerboard(screen, screen_pos, self.diffuse);
        }

        // -------------------------------------------------------------------------

        let center = NormalRoughness::unpack(
            self.normal_roughness.load(screen_pos),
        );

        let center_pos = self
            .params
            .frustum()
            .reconstruct(screen.uv(screen_pos), view_z);

        let diffuse_radius = self.params.diffuse_blur_radius;
        let specular_radius =
            self.params.specular_blur_radius * center.roughness;

        if diffuse_radius > 0.0 {
            out.diffuse = self.blur(
                screen,
                screen_pos,
                center.normal,
                center_pos,
                view_z,
                self.diffuse,
                out.diffuse,
                diffuse_radius,
            );
        }

        if specular_radius > 0.0 {
            out.specular = self.blur(
                screen,
                screen_pos,
                center.normal,
                center_pos,
                view_z,
                self.specular,
                out.specular,
                specular_radius,
            );
        }

        out
    }

    fn is_present(&self, screen_pos: UVec2) -> bool {
        let mode = self.params.checkerboard;

        if mode == CHECKERBOARD_OFF {
            return true;
        }

        (screen_pos.x + screen_pos.y + self.params.frame_index) % 2 == mode
    }

    fn resolve_checkerboard(
        &self,
        screen: Screen,
        screen_pos: UVec2,
        tex: &T,
    ) -> Vec4 {
        let mut sum = Vec4::ZERO;
        let mut count = 0.0;

        let mut dx = -1;

        while dx <= 1 {
            let pos = screen_pos.as_ivec2() + ivec2(dx, 0);

            dx += 2;

            if !screen.contains_signed(pos) {
                continue;
            }

            let pos = pos.as_uvec2();

            if is_in_denoising_range(
                self.view_z.load(pos).x,
                self.params.denoising_range,
            ) {
                sum += tex.load(pos);
                count += 1.0;
            }
        }

        if count > 0.0 {
            sum / count
        } else {
            tex.load(screen_pos)
        }
    }

    /// Blurs `tex` using a (per-frame rotated) golden-angle spiral.
    fn blur(
        &self,
        screen: Screen,
        screen_pos: UVec2,
        center_normal: Vec3,
        center_pos: Vec3,
        center_view_z: f32,
        tex: &T,
        center: Vec4,
        radius: f32,
    ) -> Vec4 {
        let frustum = self.params.frustum();
        let rotator = self.params.rotator;
        let mut sum = center;
        let mut w_sum = 1.0;
        let mut sample_idx = 0;

        while sample_idx < SAMPLES {
            let angle = sample_idx as f32 * GOLDEN_ANGLE;

            let dist = radius
                * ((sample_idx as f32 + 0.5) / SAMPLES as f32).sqrt();

            let offset = vec2(angle.cos(), angle.sin()) * dist;

            let offset = vec2(
                rotator.x * offset.x + rotator.z * offset.y,
                rotator.y * offset.x + rotator.w * offset.y,
            );

            sample_idx += 1;

            let sample_pos = (screen_pos.as_vec2() + vec2(0.5, 0.5) + offset)
                .floor()
                .as_ivec2();

            if !screen.contains_signed(sample_pos) {
                continue;
            }

            let sample_pos = sample_pos.as_uvec2();

            if sample_pos == screen_pos || !self.is_present(sample_pos) {
                continue;
            }

            let sample_view_z = self.view_z.load(sample_pos).x;

            if !is_in_denoising_range(
                sample_view_z,
                self.params.denoising_range,
            ) {
                continue;
            }

            let sample = NormalRoughness::unpack(
                self.normal_roughness.load(sample_pos),
            );

            let w = geometry_weight(
                center_pos,
                center_normal,
                frustum.reconstruct(screen.uv(sample_pos), sample_view_z),
                center_view_z,
                PHI_DEPTH,
            ) * normal_weight(center_normal, sample.normal, NORMAL_POWER);

            sum += tex.load(sample_pos) * w;
            w_sum += w;
        }

        sum / w_sum
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{uvec2, vec3};

    use super::*;
    use crate::testing::{frustum, scalar, TestTex};

    const SIZE: UVec2 = UVec2::new(8, 8);

    struct Scene {
        specular: TestTex,
        diffuse: TestTex,
        normal_roughness: TestTex,
        view_z: TestTex,
    }

    impl Scene {
        fn new() -> Self {
            let mut diffuse = TestTex::filled(SIZE, vec4(1.0, 1.0, 1.0, 0.0));

            diffuse.set(uvec2(4, 4), vec4(9.0, 9.0, 9.0, 0.0));

            Self {
                specular: TestTex::filled(SIZE, vec4(0.5, 0.5, 0.5, 2.0)),
                diffuse,
                normal_roughness: TestTex::filled(
                    SIZE,
                    NormalRoughness::new(vec3(0.0, 0.0, 1.0), 1.0).pack(),
                ),
                view_z: TestTex::filled(SIZE, scalar(250.0)),
            }
        }

        fn run(&self, params: &PrepassParams, pos: UVec2) -> PrepassOutput {
            Prepass {
                params,
                specular: &self.specular,
                diffuse: &self.diffuse,
                normal_roughness: &self.normal_roughness,
                view_z: &self.view_z,
            }
            .run(pos)
        }
    }

    fn params() -> PrepassParams {
        let [frustum_right, frustum_up, frustum_forward] = frustum();

        PrepassParams {
            rotator: vec4(1.0, 0.0, -0.0, 1.0),
            frustum_right,
            frustum_up,
            frustum_forward,
            resolution: SIZE,
            checkerboard: CHECKERBOARD_OFF,
            denoising_range: 1000.0,
            units_per_meter: 100.0,
            ..Default::default()
        }
    }

    #[test]
    fn zero_radius_is_a_copy() {
        let scene = Scene::new();
        let out = scene.run(&params(), uvec2(4, 4));

        assert_eq!(vec4(9.0, 9.0, 9.0, 0.0), out.diffuse);
        assert_eq!(vec4(0.5, 0.5, 0.5, 2.0), out.specular);
        assert_eq!(250.0, out.view_z.x);
        assert_relative_eq!(2.5, out.scaled_view_z.x);
    }

    #[test]
    fn blur_spreads_outliers() {
        let scene = Scene::new();

        let out = scene.run(
            &PrepassParams {
                diffuse_blur_radius: 3.0,
                ..params()
            },
            uvec2(4, 4),
        );

        assert!(out.diffuse.x < 9.0);
        assert!(out.diffuse.x > 1.0);
    }

    #[test]
    fn checkerboard_resolves_missing_pixels() {
        let scene = Scene::new();

        // With black checkerboard at frame 0, (4, 4) is present and (4, 3)
        // is missing.
        let params = PrepassParams {
            checkerboard: 0,
            ..params()
        };

        assert_eq!(9.0, scene.run(&params, uvec2(4, 4)).diffuse.x);
        assert_eq!(1.0, scene.run(&params, uvec2(4, 3)).diffuse.x);
        assert_eq!(5.0, scene.run(&params, uvec2(3, 4)).diffuse.x);
    }

    #[test]
    fn out_of_range_pixels_are_untouched() {
        let scene = Scene::new();

        let out = scene.run(
            &PrepassParams {
                diffuse_blur_radius: 3.0,
                denoising_range: 100.0,
                ..params()
            },
            uvec2(4, 4),
        );

        assert_eq!(9.0, out.diffuse.x);
    }
}

use glam::{vec2, vec4, UVec2, Vec4, Vec4Swizzles};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{
    is_in_denoising_range, lerp, project, BilinearFilter, CatmullRom, F32Ext,
    HistoryLength, NormalRoughness, ReprojectionPassParams, Screen, TexRead,
    Vec3Ext,
};

/// Footprints with less total weight than this are treated as disoccluded.
const MIN_FOOTPRINT: f32 = 1.0e-3;

pub struct Reprojection<'a, T> {
    pub params: &'a ReprojectionPassParams,

    /// Noisy specular radiance, with hit distance in `.w`
    pub specular: &'a T,

    pub diffuse: &'a T,

    /// Pixel offset to previous frame in `.xy`, view depth delta in `.z`,
    /// validity in `.w`
    pub motion: &'a T,

    pub normal_roughness: &'a T,
    pub view_z: &'a T,
    pub prev_specular: &'a T,
    pub prev_diffuse: &'a T,
    pub prev_specular_responsive: &'a T,
    pub prev_diffuse_responsive: &'a T,
    pub prev_normal_roughness: &'a T,
    pub prev_view_z: &'a T,
    pub prev_hit_distance: &'a T,
    pub prev_history_length: &'a T,
    pub specular_confidence: &'a T,
    pub diffuse_confidence: &'a T,
}

/// Illumination outputs carry color in `.xyz` and the luminance's second
/// moment in `.w`.
#[derive(Clone, Copy)]
pub struct ReprojectionOutput {
    pub specular: Vec4,
    pub diffuse: Vec4,
    pub specular_responsive: Vec4,
    pub diffuse_responsive: Vec4,
    pub hit_distance: Vec4,
    pub history_length: Vec4,
    pub specular_confidence: Vec4,
}

impl<'a, T> Reprojection<'a, T>
where
    T: TexRead,
{
    pub fn run(&self, screen_pos: UVec2) -> ReprojectionOutput {
        let screen = Screen::new(self.params.resolution);
        let specular = self.specular.load(screen_pos);
        let diffuse = self.diffuse.load(screen_pos).xyz();
        let hit_distance = specular.w;
        let specular = specular.xyz();

        let (specular_confidence, diffuse_confidence) =
            if self.params.use_confidence_inputs != 0 {
                (
                    self.specular_confidence.load(screen_pos).x.saturate(),
                    self.diffuse_confidence.load(screen_pos).x.saturate(),
                )
            } else {
                (1.0, 1.0)
            };

        let specular_moment = specular.luma().sqr()
            * (1.0 + self.params.specular_variance_boost);

        let fresh = ReprojectionOutput {
            specular: specular.extend(specular_moment),
            diffuse: diffuse.extend(diffuse.luma().sqr()),
            specular_responsive: specular.extend(specular_moment),
            diffuse_responsive: diffuse.extend(diffuse.luma().sqr()),
            hit_distance: vec4(hit_distance, 0.0, 0.0, 0.0),
            history_length: HistoryLength::FRESH.pack(),
            specular_confidence: Vec4::ZERO,
        };

        if self.params.reset_history != 0 {
            return fresh;
        }

        let view_z = self.view_z.load(screen_pos).x;

        if !is_in_denoising_range(view_z, self.params.denoising_range) {
            return fresh;
        }

        // -------------------------------------------------------------------------

        let surface =
            NormalRoughness::unpack(self.normal_roughness.load(screen_pos));

        let motion = self.motion.load(screen_pos);

        let (prev_pos, prev_view_z) = if motion.w > 0.0 {
            (
                screen_pos.as_vec2() + vec2(0.5, 0.5) + motion.xy(),
                view_z + motion.z,
            )
        } else {
            let pos = self.params.camera_position.xyz()
                + self
                    .params
                    .frustum()
                    .reconstruct(screen.uv(screen_pos), view_z);

            let prev = project(self.params.prev_world_to_clip, pos);

            (vec2(prev.x, prev.y) * screen.size.as_vec2(), prev.z)
        };

        if prev_view_z <= 0.0 {
            return fresh;
        }

        let depth_tolerance = self.params.disocclusion_threshold
            * (1.0 + self.params.jitter_delta)
            * prev_view_z;

        let filter = BilinearFilter::new(prev_pos, |pos| {
            if !screen.contains_signed(pos) {
                return false;
            }

            let pos = pos.as_uvec2();
            let tap_view_z = self.prev_view_z.load(pos).x;

            if tap_view_z <= 0.0
                || (tap_view_z - prev_view_z).abs() > depth_tolerance
            {
                return false;
            }

            let tap_normal =
                NormalRoughness::unpack(self.prev_normal_roughness.load(pos))
                    .normal;

            tap_normal.dot(surface.normal)
                >= self.params.reject_diffuse_history_normal_threshold
        });

        let footprint = filter.footprint();

        if footprint < MIN_FOOTPRINT {
            return fresh;
        }

        // -------------------------------------------------------------------------

        let prev_history_length = HistoryLength::unpack(
            filter.eval(|pos| self.prev_history_length.load(pos.as_uvec2())),
        );

        let mut specular_max = self.params.specular_max_accumulated_frame_num;

        if self.params.roughness_based_specular_accumulation != 0 {
            specular_max = (specular_max * surface.roughness.sqrt()).floor();
        }

        let specular_max = specular_max.max(1.0);
        let diffuse_max =
            self.params.diffuse_max_accumulated_frame_num.max(1.0);

        let specular_len = lerp(
            1.0,
            (prev_history_length.specular + 1.0).min(specular_max),
            specular_confidence,
        );

        let diffuse_len = lerp(
            1.0,
            (prev_history_length.diffuse + 1.0).min(diffuse_max),
            diffuse_confidence,
        );

        let fast_max = |frames: f32| {
            (frames * self.params.framerate_scale).floor().max(1.0)
        };

        let specular_fast_len = specular_len
            .min(fast_max(self.params.specular_max_fast_accumulated_frame_num));

        let diffuse_fast_len = diffuse_len
            .min(fast_max(self.params.diffuse_max_fast_accumulated_frame_num));

        let confidence = footprint * specular_confidence;

        let specular_moment = specular.luma().sqr()
            * (1.0 + self.params.specular_variance_boost * (1.0 - confidence));

        let curr_specular = specular.extend(specular_moment);
        let curr_diffuse = fresh.diffuse;

        let prev_hit_distance = filter
            .eval(|pos| self.prev_hit_distance.load(pos.as_uvec2()))
            .x;

        ReprojectionOutput {
            specular: lerp(
                self.sample_history(screen, filter, self.prev_specular),
                curr_specular,
                1.0 / specular_len,
            ),
            diffuse: lerp(
                self.sample_history(screen, filter, self.prev_diffuse),
                curr_diffuse,
                1.0 / diffuse_len,
            ),
            specular_responsive: lerp(
                self.sample_history(
                    screen,
                    filter,
                    self.prev_specular_responsive,
                ),
                curr_specular,
                1.0 / specular_fast_len,
            ),
            diffuse_responsive: lerp(
                self.sample_history(
                    screen,
                    filter,
                    self.prev_diffuse_responsive,
                ),
                curr_diffuse,
                1.0 / diffuse_fast_len,
            ),
            hit_distance: vec4(
                lerp(prev_hit_distance, hit_distance, 1.0 / specular_len),
                0.0,
                0.0,
                0.0,
            ),
            history_length: HistoryLength::new(specular_len, diffuse_len)
                .pack(),
            specular_confidence: vec4(confidence, 0.0, 0.0, 0.0),
        }
    }

    fn sample_history(
        &self,
        screen: Screen,
        filter: BilinearFilter,
        tex: &T,
    ) -> Vec4 {
        if self.params.use_bicubic != 0 && filter.is_fully_valid() {
            CatmullRom::eval(filter.origin, filter.frac, |pos| {
                tex.load(screen.clamp(pos))
            })
            .max(Vec4::ZERO)
        } else {
            filter.eval(|pos| tex.load(pos.as_uvec2()))
        }
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
        motion: TestTex,
        normal_roughness: TestTex,
        view_z: TestTex,
        prev_illumination: TestTex,
        prev_normal_roughness: TestTex,
        prev_view_z: TestTex,
        prev_hit_distance: TestTex,
        prev_history_length: TestTex,
        confidence: TestTex,
    }

    impl Scene {
        fn new(prev_history_length: HistoryLength) -> Self {
            let normal_roughness =
                NormalRoughness::new(vec3(0.0, 0.0, 1.0), 0.5).pack();

            Self {
                specular: TestTex::filled(SIZE, vec4(1.0, 1.0, 1.0, 3.0)),
                diffuse: TestTex::filled(SIZE, vec4(1.0, 1.0, 1.0, 0.0)),
                motion: TestTex::filled(SIZE, vec4(0.0, 0.0, 0.0, 1.0)),
                normal_roughness: TestTex::filled(SIZE, normal_roughness),
                view_z: TestTex::filled(SIZE, scalar(10.0)),
                prev_illumination: TestTex::filled(
                    SIZE,
                    vec4(0.5, 0.5, 0.5, 0.25),
                ),
                prev_normal_roughness: TestTex::filled(SIZE, normal_roughness),
                prev_view_z: TestTex::filled(SIZE, scalar(10.0)),
                prev_hit_distance: TestTex::filled(SIZE, scalar(1.0)),
                prev_history_length: TestTex::filled(
                    SIZE,
                    prev_history_length.pack(),
                ),
                confidence: TestTex::filled(SIZE, Vec4::ZERO),
            }
        }

        fn run(
            &self,
            params: &ReprojectionPassParams,
            pos: UVec2,
        ) -> ReprojectionOutput {
            Reprojection {
                params,
                specular: &self.specular,
                diffuse: &self.diffuse,
                motion: &self.motion,
                normal_roughness: &self.normal_roughness,
                view_z: &self.view_z,
                prev_specular: &self.prev_illumination,
                prev_diffuse: &self.prev_illumination,
                prev_specular_responsive: &self.prev_illumination,
                prev_diffuse_responsive: &self.prev_illumination,
                prev_normal_roughness: &self.prev_normal_roughness,
                prev_view_z: &self.prev_view_z,
                prev_hit_distance: &self.prev_hit_distance,
                prev_history_length: &self.prev_history_length,
                specular_confidence: &self.confidence,
                diffuse_confidence: &self.confidence,
            }
            .run(pos)
        }
    }

    fn params() -> ReprojectionPassParams {
        let [frustum_right, frustum_up, frustum_forward] = frustum();

        ReprojectionPassParams {
            frustum_right,
            frustum_up,
            frustum_forward,
            resolution: SIZE,
            denoising_range: 1000.0,
            disocclusion_threshold: 0.01,
            specular_variance_boost: 1.0,
            specular_max_accumulated_frame_num: 63.0,
            specular_max_fast_accumulated_frame_num: 4.0,
            diffuse_max_accumulated_frame_num: 63.0,
            diffuse_max_fast_accumulated_frame_num: 0.0,
            framerate_scale: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn static_history_is_accumulated() {
        let scene = Scene::new(HistoryLength::new(5.0, 5.0));
        let out = scene.run(&params(), uvec2(3, 3));

        assert_eq!(
            HistoryLength::new(6.0, 6.0),
            HistoryLength::unpack(out.history_length)
        );

        assert_relative_eq!(0.5 + 0.5 / 6.0, out.diffuse.x, epsilon = 1.0e-6);
        assert_relative_eq!(0.5 + 0.5 / 4.0, out.specular_responsive.x);
        assert_relative_eq!(1.0, out.diffuse_responsive.x);
        assert_relative_eq!(1.0 + 2.0 / 6.0, out.hit_distance.x);
        assert_relative_eq!(1.0, out.specular_confidence.x);
    }

    #[test]
    fn framerate_scales_responsive_history() {
        let scene = Scene::new(HistoryLength::new(5.0, 5.0));

        let run = |framerate_scale| {
            scene.run(
                &ReprojectionPassParams {
                    framerate_scale,
                    ..params()
                },
                uvec2(3, 3),
            )
        };

        // 120 Hz: the cap of 4 frames becomes 8, so the history's own length
        // (6) takes over
        let out = run(2.0);

        assert_relative_eq!(
            0.5 + 0.5 / 6.0,
            out.specular_responsive.x,
            epsilon = 1.0e-6
        );

        // 15 Hz: a single frame
        let out = run(0.25);

        assert_relative_eq!(1.0, out.specular_responsive.x);

        // The regular history doesn't care
        assert_relative_eq!(0.5 + 0.5 / 6.0, out.diffuse.x, epsilon = 1.0e-6);
        assert_eq!(
            HistoryLength::new(6.0, 6.0),
            HistoryLength::unpack(out.history_length)
        );
    }

    #[test]
    fn reset_discards_history() {
        let scene = Scene::new(HistoryLength::new(5.0, 5.0));

        let out = scene.run(
            &ReprojectionPassParams {
                reset_history: 1,
                ..params()
            },
            uvec2(3, 3),
        );

        assert_eq!(
            HistoryLength::FRESH,
            HistoryLength::unpack(out.history_length)
        );

        assert_eq!(1.0, out.diffuse.x);
        assert_eq!(0.0, out.specular_confidence.x);
    }

    #[test]
    fn depth_mismatch_is_disocclusion() {
        let mut scene = Scene::new(HistoryLength::new(5.0, 5.0));

        scene.prev_view_z = TestTex::filled(SIZE, scalar(12.0));

        let out = scene.run(&params(), uvec2(3, 3));

        assert_eq!(
            HistoryLength::FRESH,
            HistoryLength::unpack(out.history_length)
        );
    }

    #[test]
    fn off_screen_history_is_disocclusion() {
        let mut scene = Scene::new(HistoryLength::new(5.0, 5.0));

        scene.motion = TestTex::filled(SIZE, vec4(-20.0, 0.0, 0.0, 1.0));

        let out = scene.run(&params(), uvec2(3, 3));

        assert_eq!(
            HistoryLength::FRESH,
            HistoryLength::unpack(out.history_length)
        );
    }

    #[test]
    fn lengths_are_capped() {
        let scene = Scene::new(HistoryLength::new(63.0, 63.0));

        let out = scene.run(
            &ReprojectionPassParams {
                specular_max_accumulated_frame_num: 10.0,
                ..params()
            },
            uvec2(3, 3),
        );

        assert_eq!(
            HistoryLength::new(10.0, 63.0),
            HistoryLength::unpack(out.history_length)
        );
    }

    #[test]
    fn roughness_shortens_specular_history() {
        let scene = Scene::new(HistoryLength::new(63.0, 63.0));

        let out = scene.run(
            &ReprojectionPassParams {
                roughness_based_specular_accumulation: 1,
                ..params()
            },
            uvec2(3, 3),
        );

        // floor(63 * sqrt(0.5))
        assert_eq!(44.0, HistoryLength::unpack(out.history_length).specular);
    }

    #[test]
    fn camera_motion_fallback() {
        let mut scene = Scene::new(HistoryLength::new(5.0, 5.0));

        scene.motion = TestTex::filled(SIZE, Vec4::ZERO);

        let out = scene.run(
            &ReprojectionPassParams {
                prev_world_to_clip: glam::Mat4::perspective_rh(
                    90.0f32.to_radians(),
                    1.0,
                    0.1,
                    100.0,
                ),
                ..params()
            },
            uvec2(3, 3),
        );

        assert_eq!(
            HistoryLength::new(6.0, 6.0),
            HistoryLength::unpack(out.history_length)
        );
    }
}

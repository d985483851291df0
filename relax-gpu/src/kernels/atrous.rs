use glam::{ivec2, UVec2, Vec3, Vec4, Vec4Swizzles};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{
    geometry_weight, is_in_denoising_range, luminance_weight, normal_weight,
    roughness_weight, specular_lobe_half_angle, specular_normal_weight,
    AtrousPassParams, F32Ext, HistoryLength, NormalRoughness, Screen,
    TexRead, Vec3Ext, ATROUS_KERNEL, RELAX_EPSILON,
};

/// Roughness difference at which the roughness weight reaches zero.
const ROUGHNESS_TOLERANCE: f32 = 0.1;

/// History length from which a pixel's variance is trusted fully.
const MATURE_HISTORY_LENGTH: f32 = 4.0;

/// Single iteration of the edge-aware à-trous wavelet filter.
///
/// `I` provides the illumination (color + variance) inputs and `G` provides
/// the guides; they are separate so that the first iteration can read its
/// illumination from a workgroup-local cache.
pub struct Atrous<'a, I, G> {
    pub params: &'a AtrousPassParams,
    pub specular: &'a I,
    pub diffuse: &'a I,
    pub specular_reprojection_confidence: &'a G,
    pub history_length: &'a G,
    pub normal_roughness: &'a G,
    pub scaled_view_z: &'a G,
}

/// Illumination outputs carry color in `.xyz` and variance of its luminance
/// in `.w`.
#[derive(Clone, Copy)]
pub struct AtrousOutput {
    pub specular: Vec4,
    pub diffuse: Vec4,
}

impl<'a, I, G> Atrous<'a, I, G>
where
    I: TexRead,
    G: TexRead,
{
    pub fn run(&self, screen_pos: UVec2) -> AtrousOutput {
        let specular = self.specular.load(screen_pos);
        let diffuse = self.diffuse.load(screen_pos);
        let view_z = self.scaled_view_z.load(screen_pos).x;

        if !is_in_denoising_range(view_z, self.params.denoising_range) {
            return AtrousOutput { specular, diffuse };
        }

        let screen = Screen::new(self.params.resolution);
        let frustum = self.params.frustum();

        let center =
            NormalRoughness::unpack(self.normal_roughness.load(screen_pos));

        let center_pos = frustum.reconstruct(screen.uv(screen_pos), view_z);

        // Low-confidence areas rely more on the spatial filter
        let relaxation = 1.0
            - self
                .specular_reprojection_confidence
                .load(screen_pos)
                .x
                .saturate();

        // Variance of pixels with a short history is still mostly noise, so
        // their luminance weights are relaxed as well
        let history_length =
            HistoryLength::unpack(self.history_length.load(screen_pos));

        let specular_luminance_relaxation =
            relaxation.max(Self::youth(history_length.specular));

        let diffuse_luminance_relaxation = Self::youth(history_length.diffuse);

        let (specular_variance, diffuse_variance) =
            self.blurred_variance(screen, screen_pos);

        let specular_luma = specular.xyz().luma();
        let diffuse_luma = diffuse.xyz().luma();

        let specular_phi_luminance = self.params.specular_phi_luminance
            * (1.0
                + self.params.luminance_edge_stopping_relaxation
                    * specular_luminance_relaxation);

        let diffuse_phi_luminance = self.params.diffuse_phi_luminance
            * (1.0
                + self.params.luminance_edge_stopping_relaxation
                    * diffuse_luminance_relaxation);

        let specular_luminance_denominator = specular_phi_luminance
            * specular_variance.max(0.0).sqrt()
            + RELAX_EPSILON;

        let diffuse_luminance_denominator = diffuse_phi_luminance
            * diffuse_variance.max(0.0).sqrt()
            + RELAX_EPSILON;

        let lobe_half_angle = (specular_lobe_half_angle(
            center.roughness,
            self.params.specular_lobe_angle_fraction,
        ) + self.params.specular_lobe_angle_slack)
            * (1.0 + self.params.normal_edge_stopping_relaxation * relaxation);

        let roughness_tolerance = ROUGHNESS_TOLERANCE
            * (1.0
                + self.params.roughness_edge_stopping_relaxation * relaxation);

        // -------------------------------------------------------------------------

        let center_w = ATROUS_KERNEL[0];
        let mut specular_sum = specular.xyz() * center_w;
        let mut specular_w_sum = center_w;
        let mut specular_variance_sum = specular.w * center_w * center_w;
        let mut diffuse_sum = diffuse.xyz() * center_w;
        let mut diffuse_w_sum = center_w;
        let mut diffuse_variance_sum = diffuse.w * center_w * center_w;
        let step = self.params.step_size as i32;

        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }

                let pos = screen_pos.as_ivec2() + ivec2(dx, dy) * step;

                if !screen.contains_signed(pos) {
                    continue;
                }

                let pos = pos.as_uvec2();
                let sample_view_z = self.scaled_view_z.load(pos).x;

                if !is_in_denoising_range(
                    sample_view_z,
                    self.params.denoising_range,
                ) {
                    continue;
                }

                let sample =
                    NormalRoughness::unpack(self.normal_roughness.load(pos));

                let kernel = ATROUS_KERNEL[(dx.abs() + dy.abs()) as usize];

                let geometry = geometry_weight(
                    center_pos,
                    center.normal,
                    frustum.reconstruct(screen.uv(pos), sample_view_z),
                    view_z,
                    self.params.phi_depth,
                );

                let sample_specular = self.specular.load(pos);
                let sample_diffuse = self.diffuse.load(pos);

                let diffuse_w = kernel
                    * geometry
                    * normal_weight(
                        center.normal,
                        sample.normal,
                        self.params.phi_normal,
                    )
                    * luminance_weight(
                        diffuse_luma,
                        sample_diffuse.xyz().luma(),
                        diffuse_luminance_denominator,
                        self.params.max_luminance_relative_difference,
                    );

                let mut specular_w = kernel
                    * geometry
                    * specular_normal_weight(
                        center.normal,
                        sample.normal,
                        lobe_half_angle,
                    )
                    * luminance_weight(
                        specular_luma,
                        sample_specular.xyz().luma(),
                        specular_luminance_denominator,
                        self.params.max_luminance_relative_difference,
                    );

                if self.params.roughness_edge_stopping != 0 {
                    specular_w *= roughness_weight(
                        center.roughness,
                        sample.roughness,
                        roughness_tolerance,
                    );
                }

                specular_sum += sample_specular.xyz() * specular_w;
                specular_w_sum += specular_w;
                specular_variance_sum += sample_specular.w * specular_w.sqr();

                diffuse_sum += sample_diffuse.xyz() * diffuse_w;
                diffuse_w_sum += diffuse_w;
                diffuse_variance_sum += sample_diffuse.w * diffuse_w.sqr();
            }
        }

        AtrousOutput {
            specular: Self::normalize(
                specular_sum,
                specular_w_sum,
                specular_variance_sum,
            ),
            diffuse: Self::normalize(
                diffuse_sum,
                diffuse_w_sum,
                diffuse_variance_sum,
            ),
        }
    }

    /// Returns `1.0` for a freshly disoccluded pixel, fading to `0.0` at
    /// [`MATURE_HISTORY_LENGTH`].
    fn youth(history_length: f32) -> f32 {
        1.0 - ((history_length - 1.0) / (MATURE_HISTORY_LENGTH - 1.0))
            .saturate()
    }

    fn normalize(sum: Vec3, w_sum: f32, variance_sum: f32) -> Vec4 {
        (sum / w_sum).extend(variance_sum / (w_sum * w_sum))
    }

    /// Returns 3x3 blurred specular and diffuse variances around the pixel.
    fn blurred_variance(
        &self,
        screen: Screen,
        screen_pos: UVec2,
    ) -> (f32, f32) {
        let mut specular = 0.0;
        let mut diffuse = 0.0;
        let mut w_sum = 0.0;

        for dy in -1..=1 {
            for dx in -1..=1 {
                let pos = screen_pos.as_ivec2() + ivec2(dx, dy);

                if !screen.contains_signed(pos) {
                    continue;
                }

                let pos = pos.as_uvec2();
                let w = ATROUS_KERNEL[(dx.abs() + dy.abs()) as usize];

                specular += self.specular.load(pos).w * w;
                diffuse += self.diffuse.load(pos).w * w;
                w_sum += w;
            }
        }

        (specular / w_sum, diffuse / w_sum)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{uvec2, vec3, vec4};

    use super::*;
    use crate::testing::{frustum, scalar, TestTex};

    const SIZE: UVec2 = UVec2::new(8, 8);

    struct Scene {
        illumination: TestTex,
        confidence: TestTex,
        history_length: TestTex,
        normal_roughness: TestTex,
        view_z: TestTex,
    }

    impl Scene {
        fn new(illumination: Vec4) -> Self {
            Self {
                illumination: TestTex::filled(SIZE, illumination),
                confidence: TestTex::filled(SIZE, scalar(1.0)),
                history_length: TestTex::filled(
                    SIZE,
                    HistoryLength::new(10.0, 10.0).pack(),
                ),
                normal_roughness: TestTex::filled(
                    SIZE,
                    NormalRoughness::new(vec3(0.0, 0.0, 1.0), 0.5).pack(),
                ),
                view_z: TestTex::filled(SIZE, scalar(1.0)),
            }
        }

        fn run(&self, pos: UVec2) -> AtrousOutput {
            let [frustum_right, frustum_up, frustum_forward] = frustum();

            Atrous {
                params: &AtrousPassParams {
                    frustum_right,
                    frustum_up,
                    frustum_forward,
                    resolution: SIZE,
                    step_size: 1,
                    roughness_edge_stopping: 1,
                    specular_phi_luminance: 2.0,
                    diffuse_phi_luminance: 2.0,
                    max_luminance_relative_difference: f32::MAX,
                    phi_normal: 64.0,
                    phi_depth: 0.01,
                    specular_lobe_angle_fraction: 0.333,
                    specular_lobe_angle_slack: 0.3f32.to_radians(),
                    roughness_edge_stopping_relaxation: 0.3,
                    normal_edge_stopping_relaxation: 0.3,
                    luminance_edge_stopping_relaxation: 1.0,
                    denoising_range: 10.0,
                    ..Default::default()
                },
                specular: &self.illumination,
                diffuse: &self.illumination,
                specular_reprojection_confidence: &self.confidence,
                history_length: &self.history_length,
                normal_roughness: &self.normal_roughness,
                scaled_view_z: &self.view_z,
            }
            .run(pos)
        }
    }

    #[test]
    fn flat_signal_is_preserved_and_variance_shrinks() {
        let out = Scene::new(vec4(0.3, 0.3, 0.3, 0.01)).run(uvec2(4, 4));

        assert_relative_eq!(0.3, out.diffuse.x, epsilon = 1.0e-6);
        assert_relative_eq!(0.3, out.specular.x, epsilon = 1.0e-6);
        assert!(out.diffuse.w < 0.01);
        assert!(out.diffuse.w > 0.0);
    }

    #[test]
    fn depth_edges_are_preserved() {
        let mut scene = Scene::new(vec4(1.0, 1.0, 1.0, 1.0));

        for y in 0..SIZE.y {
            for x in 4..SIZE.x {
                scene.view_z.set(uvec2(x, y), scalar(2.0));
                scene.illumination.set(uvec2(x, y), vec4(5.0, 5.0, 5.0, 1.0));
            }
        }

        let out = scene.run(uvec2(3, 4));

        assert_relative_eq!(1.0, out.diffuse.x, epsilon = 1.0e-5);
    }

    #[test]
    fn young_history_relaxes_luminance_weights() {
        let mut scene = Scene::new(vec4(1.0, 1.0, 1.0, 0.01));

        for y in 0..SIZE.y {
            for x in 4..SIZE.x {
                scene.illumination.set(uvec2(x, y), vec4(2.0, 2.0, 2.0, 0.01));
            }
        }

        let mature = scene.run(uvec2(3, 4));

        scene.history_length =
            TestTex::filled(SIZE, HistoryLength::FRESH.pack());

        let fresh = scene.run(uvec2(3, 4));

        assert!(mature.diffuse.x > 1.0);
        assert!(fresh.diffuse.x > mature.diffuse.x + 1.0e-3);
        assert!(fresh.specular.x > mature.specular.x + 1.0e-3);
    }
}

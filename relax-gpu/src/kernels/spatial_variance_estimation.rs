use glam::{ivec2, UVec2, Vec3, Vec4, Vec4Swizzles};

use crate::{
    geometry_weight, is_in_denoising_range, normal_weight, F32Ext,
    HistoryLength, NormalRoughness, Screen, SpatialVarianceEstimationPassParams,
    TexRead, Vec3Ext,
};

const RADIUS: i32 = 3;
const PHI_DEPTH: f32 = 0.01;

pub struct SpatialVarianceEstimation<'a, T> {
    pub params: &'a SpatialVarianceEstimationPassParams,
    pub specular: &'a T,
    pub diffuse: &'a T,
    pub history_length: &'a T,
    pub normal_roughness: &'a T,
    pub scaled_view_z: &'a T,
}

/// Illumination outputs carry color in `.xyz` and variance of its luminance
/// in `.w`.
#[derive(Clone, Copy)]
pub struct SpatialVarianceEstimationOutput {
    pub specular: Vec4,
    pub diffuse: Vec4,
    pub normal_roughness: Vec4,
}

impl<'a, T> SpatialVarianceEstimation<'a, T>
where
    T: TexRead,
{
    pub fn run(&self, screen_pos: UVec2) -> SpatialVarianceEstimationOutput {
        let specular = self.specular.load(screen_pos);
        let diffuse = self.diffuse.load(screen_pos);
        let normal_roughness = self.normal_roughness.load(screen_pos);
        let view_z = self.scaled_view_z.load(screen_pos).x;

        if !is_in_denoising_range(view_z, self.params.denoising_range) {
            return SpatialVarianceEstimationOutput {
                specular: specular.xyz().extend(0.0),
                diffuse: diffuse.xyz().extend(0.0),
                normal_roughness,
            };
        }

        let screen = Screen::new(self.params.resolution);
        let center = NormalRoughness::unpack(normal_roughness);

        let center_pos = self
            .params
            .frustum()
            .reconstruct(screen.uv(screen_pos), view_z);

        let history_length =
            HistoryLength::unpack(self.history_length.load(screen_pos));

        let threshold = self.params.history_threshold;

        let mut specular_variance =
            (specular.w - specular.xyz().luma().sqr()).max(0.0);

        let mut diffuse_variance =
            (diffuse.w - diffuse.xyz().luma().sqr()).max(0.0);

        let mut filtered_normal = Vec3::ZERO;

        if history_length.specular < threshold
            || history_length.diffuse < threshold
        {
            let mut specular_moments = (0.0, 0.0);
            let mut diffuse_moments = (0.0, 0.0);
            let mut w_sum = 0.0;

            for dy in -RADIUS..=RADIUS {
                for dx in -RADIUS..=RADIUS {
                    let pos = screen_pos.as_ivec2() + ivec2(dx, dy);

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

                    let sample = NormalRoughness::unpack(
                        self.normal_roughness.load(pos),
                    );

                    let geometry = geometry_weight(
                        center_pos,
                        center.normal,
                        self.params
                            .frustum()
                            .reconstruct(screen.uv(pos), sample_view_z),
                        view_z,
                        PHI_DEPTH,
                    );

                    if dx.abs() <= 1 && dy.abs() <= 1 {
                        filtered_normal += sample.normal * geometry;
                    }

                    let w = geometry
                        * normal_weight(
                            center.normal,
                            sample.normal,
                            self.params.phi_normal,
                        );

                    let specular_luma = self.specular.load(pos).xyz().luma();
                    let diffuse_luma = self.diffuse.load(pos).xyz().luma();

                    specular_moments.0 += specular_luma * w;
                    specular_moments.1 += specular_luma.sqr() * w;
                    diffuse_moments.0 += diffuse_luma * w;
                    diffuse_moments.1 += diffuse_luma.sqr() * w;
                    w_sum += w;
                }
            }

            if w_sum > 0.0 {
                if history_length.specular < threshold {
                    specular_variance = Self::spatial_variance(
                        specular_moments,
                        w_sum,
                        threshold,
                        history_length.specular,
                    );
                }

                if history_length.diffuse < threshold {
                    diffuse_variance = Self::spatial_variance(
                        diffuse_moments,
                        w_sum,
                        threshold,
                        history_length.diffuse,
                    );
                }
            }
        } else {
            filtered_normal = self.filter_normal(
                screen,
                screen_pos,
                center.normal,
                center_pos,
                view_z,
            );
        }

        let filtered_normal = filtered_normal.normalize_or_zero();

        let filtered_normal = if filtered_normal == Vec3::ZERO {
            center.normal
        } else {
            filtered_normal
        };

        SpatialVarianceEstimationOutput {
            specular: specular.xyz().extend(specular_variance),
            diffuse: diffuse.xyz().extend(diffuse_variance),
            normal_roughness: NormalRoughness::new(
                filtered_normal,
                center.roughness,
            )
            .pack(),
        }
    }

    /// Turns spatial luminance moments into variance, boosted for pixels
    /// that are further away from having a trusted temporal estimate.
    fn spatial_variance(
        (m1, m2): (f32, f32),
        w_sum: f32,
        threshold: f32,
        history_length: f32,
    ) -> f32 {
        let m1 = m1 / w_sum;
        let m2 = m2 / w_sum;

        (m2 - m1 * m1).max(0.0) * (threshold / history_length.max(1.0))
    }

    /// Depth-aware 3x3 average of normals.
    fn filter_normal(
        &self,
        screen: Screen,
        screen_pos: UVec2,
        center_normal: Vec3,
        center_pos: Vec3,
        center_view_z: f32,
    ) -> Vec3 {
        let frustum = self.params.frustum();
        let mut sum = Vec3::ZERO;

        for dy in -1..=1 {
            for dx in -1..=1 {
                let pos = screen_pos.as_ivec2() + ivec2(dx, dy);

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

                sum += sample.normal
                    * geometry_weight(
                        center_pos,
                        center_normal,
                        frustum.reconstruct(screen.uv(pos), sample_view_z),
                        center_view_z,
                        PHI_DEPTH,
                    );
            }
        }

        sum
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{uvec2, vec3, vec4};

    use super::*;
    use crate::testing::{frustum, scalar, TestTex};

    const SIZE: UVec2 = UVec2::new(8, 8);

    fn run(
        illumination: &TestTex,
        len: f32,
    ) -> SpatialVarianceEstimationOutput {
        let [frustum_right, frustum_up, frustum_forward] = frustum();

        let history_length =
            TestTex::filled(SIZE, HistoryLength::new(len, len).pack());

        let normal_roughness = TestTex::filled(
            SIZE,
            NormalRoughness::new(vec3(0.0, 0.0, 1.0), 0.5).pack(),
        );

        let view_z = TestTex::filled(SIZE, scalar(1.0));

        SpatialVarianceEstimation {
            params: &SpatialVarianceEstimationPassParams {
                frustum_right,
                frustum_up,
                frustum_forward,
                resolution: SIZE,
                history_threshold: 3.0,
                phi_normal: 64.0,
                denoising_range: 10.0,
                ..Default::default()
            },
            specular: illumination,
            diffuse: illumination,
            history_length: &history_length,
            normal_roughness: &normal_roughness,
            scaled_view_z: &view_z,
        }
        .run(uvec2(4, 4))
    }

    #[test]
    fn long_history_uses_temporal_variance() {
        let illumination = TestTex::filled(SIZE, vec4(0.5, 0.5, 0.5, 0.5));
        let out = run(&illumination, 10.0);

        assert_relative_eq!(0.25, out.diffuse.w, epsilon = 1.0e-5);
        assert_relative_eq!(0.5, out.diffuse.x);
        assert_relative_eq!(1.0, out.normal_roughness.z, epsilon = 1.0e-6);
    }

    #[test]
    fn short_history_uses_spatial_variance() {
        let mut illumination = TestTex::filled(SIZE, Vec4::ZERO);

        for y in 0..SIZE.y {
            for x in 0..SIZE.x {
                let value = ((x + y) % 2) as f32;

                illumination.set(
                    uvec2(x, y),
                    vec4(value, value, value, value * value),
                );
            }
        }

        // Temporal moments claim zero variance, but the neighborhood is
        // clearly noisy
        let out = run(&illumination, 1.0);

        assert!(out.diffuse.w > 0.5);
        assert!(run(&illumination, 10.0).diffuse.w < 1.0e-5);
    }
}

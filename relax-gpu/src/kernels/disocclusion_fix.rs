use glam::{vec2, UVec2, Vec3, Vec4};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{
    geometry_weight, is_in_denoising_range, normal_weight,
    DisocclusionFixPassParams, F32Ext, HistoryLength, NormalRoughness, Screen,
    TexRead,
};

pub struct DisocclusionFix<'a, T> {
    pub params: &'a DisocclusionFixPassParams,
    pub specular: &'a T,
    pub diffuse: &'a T,
    pub specular_responsive: &'a T,
    pub diffuse_responsive: &'a T,
    pub history_length: &'a T,
    pub normal_roughness: &'a T,
    pub scaled_view_z: &'a T,
}

#[derive(Clone, Copy)]
pub struct DisocclusionFixOutput {
    pub specular: Vec4,
    pub diffuse: Vec4,
    pub specular_responsive: Vec4,
    pub diffuse_responsive: Vec4,
}

impl<'a, T> DisocclusionFix<'a, T>
where
    T: TexRead,
{
    pub fn run(&self, screen_pos: UVec2) -> DisocclusionFixOutput {
        let mut out = DisocclusionFixOutput {
            specular: self.specular.load(screen_pos),
            diffuse: self.diffuse.load(screen_pos),
            specular_responsive: self.specular_responsive.load(screen_pos),
            diffuse_responsive: self.diffuse_responsive.load(screen_pos),
        };

        let view_z = self.scaled_view_z.load(screen_pos).x;

        if !is_in_denoising_range(view_z, self.params.denoising_range) {
            return out;
        }

        let history_length =
            HistoryLength::unpack(self.history_length.load(screen_pos));

        let screen = Screen::new(self.params.resolution);

        let center =
            NormalRoughness::unpack(self.normal_roughness.load(screen_pos));

        let center_pos = self
            .params
            .frustum()
            .reconstruct(screen.uv(screen_pos), view_z);

        let specular_radius = self.radius(history_length.specular);
        let diffuse_radius = self.radius(history_length.diffuse);

        if specular_radius >= 1.0 {
            (out.specular, out.specular_responsive) = self.gather(
                screen,
                screen_pos,
                center.normal,
                center_pos,
                view_z,
                specular_radius,
                [self.specular, self.specular_responsive],
                [out.specular, out.specular_responsive],
            );
        }

        if diffuse_radius >= 1.0 {
            (out.diffuse, out.diffuse_responsive) = self.gather(
                screen,
                screen_pos,
                center.normal,
                center_pos,
                view_z,
                diffuse_radius,
                [self.diffuse, self.diffuse_responsive],
                [out.diffuse, out.diffuse_responsive],
            );
        }

        out
    }

    /// Returns the gather radius for a pixel with given history length; the
    /// fewer frames the pixel has accumulated, the wider it gathers.
    fn radius(&self, history_length: f32) -> f32 {
        let frames_to_fix = self.params.frames_to_fix;

        if history_length >= frames_to_fix {
            return 0.0;
        }

        self.params.max_radius
            * (1.0 - history_length / frames_to_fix).saturate()
    }

    /// Performs a sparse 5x5 gather of two textures sharing the same weights.
    fn gather(
        &self,
        screen: Screen,
        screen_pos: UVec2,
        center_normal: Vec3,
        center_pos: Vec3,
        center_view_z: f32,
        radius: f32,
        [tex_a, tex_b]: [&T; 2],
        [center_a, center_b]: [Vec4; 2],
    ) -> (Vec4, Vec4) {
        let frustum = self.params.frustum();
        let step = radius / 2.0;
        let mut sum_a = center_a;
        let mut sum_b = center_b;
        let mut w_sum = 1.0;

        for dy in -2..=2 {
            for dx in -2..=2 {
                if dx == 0 && dy == 0 {
                    continue;
                }

                let offset = (vec2(dx as f32, dy as f32) * step).round();
                let pos = screen_pos.as_ivec2() + offset.as_ivec2();

                if pos == screen_pos.as_ivec2() || !screen.contains_signed(pos)
                {
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

                let w = geometry_weight(
                    center_pos,
                    center_normal,
                    frustum.reconstruct(screen.uv(pos), sample_view_z),
                    center_view_z,
                    self.params.disocclusion_threshold,
                ) * normal_weight(
                    center_normal,
                    sample.normal,
                    self.params.normal_power,
                );

                sum_a += tex_a.load(pos) * w;
                sum_b += tex_b.load(pos) * w;
                w_sum += w;
            }
        }

        (sum_a / w_sum, sum_b / w_sum)
    }
}

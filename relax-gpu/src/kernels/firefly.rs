use glam::{ivec2, UVec2, Vec4, Vec4Swizzles};

use crate::{
    is_in_denoising_range, FireflyPassParams, Screen, TexRead, Vec3Ext,
};

/// Clamps each pixel's luminance to the brightest of its eight neighbors,
/// removing isolated outliers.
pub struct Firefly<'a, T> {
    pub params: &'a FireflyPassParams,
    pub specular: &'a T,
    pub diffuse: &'a T,
    pub scaled_view_z: &'a T,
}

#[derive(Clone, Copy)]
pub struct FireflyOutput {
    pub specular: Vec4,
    pub diffuse: Vec4,
}

impl<'a, T> Firefly<'a, T>
where
    T: TexRead,
{
    pub fn run(&self, screen_pos: UVec2) -> FireflyOutput {
        let specular = self.specular.load(screen_pos);
        let diffuse = self.diffuse.load(screen_pos);

        if !is_in_denoising_range(
            self.scaled_view_z.load(screen_pos).x,
            self.params.denoising_range,
        ) {
            return FireflyOutput { specular, diffuse };
        }

        let screen = Screen::new(self.params.resolution);

        FireflyOutput {
            specular: self.suppress(
                screen,
                screen_pos,
                specular,
                self.specular,
            ),
            diffuse: self.suppress(screen, screen_pos, diffuse, self.diffuse),
        }
    }

    fn suppress(
        &self,
        screen: Screen,
        screen_pos: UVec2,
        center: Vec4,
        tex: &T,
    ) -> Vec4 {
        let mut max_luma = -1.0f32;

        for dy in -1..=1 {
            for dx in -1..=1 {
                let pos = screen_pos.as_ivec2() + ivec2(dx, dy);

                if (dx == 0 && dy == 0) || !screen.contains_signed(pos) {
                    continue;
                }

                let pos = pos.as_uvec2();

                if !is_in_denoising_range(
                    self.scaled_view_z.load(pos).x,
                    self.params.denoising_range,
                ) {
                    continue;
                }

                max_luma = max_luma.max(tex.load(pos).xyz().luma());
            }
        }

        let luma = center.xyz().luma();

        if max_luma < 0.0 || luma <= max_luma {
            return center;
        }

        let ratio = max_luma / luma;

        center.xyz().with_luma(max_luma).extend(center.w * ratio * ratio)
    }
}

use glam::{UVec2, Vec4, Vec4Swizzles};

use crate::{is_in_denoising_range, SplitScreenPassParams, TexRead};

/// Replaces the left part of the denoised image with the noisy input.
pub struct SplitScreen<'a, T> {
    pub params: &'a SplitScreenPassParams,
    pub view_z: &'a T,
    pub diffuse_input: &'a T,
    pub specular_input: &'a T,
    pub diffuse: &'a T,
    pub specular: &'a T,
}

#[derive(Clone, Copy)]
pub struct SplitScreenOutput {
    pub diffuse: Vec4,
    pub specular: Vec4,
}

impl<'a, T> SplitScreen<'a, T>
where
    T: TexRead,
{
    pub fn run(&self, screen_pos: UVec2) -> SplitScreenOutput {
        let x = (screen_pos.x as f32 + 0.5) / self.params.resolution.x as f32;

        let is_noisy = x < self.params.split_screen
            && is_in_denoising_range(
                self.view_z.load(screen_pos).x,
                self.params.denoising_range,
            );

        if is_noisy {
            SplitScreenOutput {
                diffuse: self.diffuse_input.load(screen_pos).xyz().extend(0.0),
                specular: self
                    .specular_input
                    .load(screen_pos)
                    .xyz()
                    .extend(0.0),
            }
        } else {
            SplitScreenOutput {
                diffuse: self.diffuse.load(screen_pos),
                specular: self.specular.load(screen_pos),
            }
        }
    }
}

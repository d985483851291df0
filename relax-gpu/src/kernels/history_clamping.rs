use glam::{ivec2, vec3, UVec2, Vec3, Vec4, Vec4Swizzles};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{HistoryClampingPassParams, HistoryLength, Screen, TexRead};

pub struct HistoryClamping<'a, T> {
    pub params: &'a HistoryClampingPassParams,
    pub specular: &'a T,
    pub diffuse: &'a T,
    pub specular_responsive: &'a T,
    pub diffuse_responsive: &'a T,
    pub history_length: &'a T,
}

#[derive(Clone, Copy)]
pub struct HistoryClampingOutput {
    pub specular: Vec4,
    pub diffuse: Vec4,
    pub history_length: Vec4,
}

impl<'a, T> HistoryClamping<'a, T>
where
    T: TexRead,
{
    pub fn run(&self, screen_pos: UVec2) -> HistoryClampingOutput {
        let screen = Screen::new(self.params.resolution);

        let mut history_length =
            HistoryLength::unpack(self.history_length.load(screen_pos));

        let (specular, specular_clamped) = self.clamp(
            screen,
            screen_pos,
            self.specular,
            self.specular_responsive,
        );

        let (diffuse, diffuse_clamped) = self.clamp(
            screen,
            screen_pos,
            self.diffuse,
            self.diffuse_responsive,
        );

        // When the slow history had to move, it is lagging behind; restart
        // it from the responsive window so it catches up quickly.
        if specular_clamped {
            history_length.specular = history_length.specular.min(
                self.params.specular_max_fast_accumulated_frame_num.max(1.0),
            );
        }

        if diffuse_clamped {
            history_length.diffuse = history_length.diffuse.min(
                self.params.diffuse_max_fast_accumulated_frame_num.max(1.0),
            );
        }

        HistoryClampingOutput {
            specular,
            diffuse,
            history_length: history_length.pack(),
        }
    }

    /// Clamps the slow history into the responsive history's 3x3 color box
    /// and returns whether that changed it noticeably.
    fn clamp(
        &self,
        screen: Screen,
        screen_pos: UVec2,
        slow: &T,
        responsive: &T,
    ) -> (Vec4, bool) {
        let mut m1 = Vec3::ZERO;
        let mut m2 = Vec3::ZERO;
        let mut count = 0.0;

        for dy in -1..=1 {
            for dx in -1..=1 {
                let pos = screen_pos.as_ivec2() + ivec2(dx, dy);

                if !screen.contains_signed(pos) {
                    continue;
                }

                let color = responsive.load(pos.as_uvec2()).xyz();

                m1 += color;
                m2 += color * color;
                count += 1.0;
            }
        }

        m1 /= count;
        m2 /= count;

        let variance = (m2 - m1 * m1).max(Vec3::ZERO);

        let sigma =
            vec3(variance.x.sqrt(), variance.y.sqrt(), variance.z.sqrt())
                * self.params.color_box_sigma_scale;

        let value = slow.load(screen_pos);
        let color = value.xyz();
        let clamped = color.clamp(m1 - sigma, m1 + sigma);

        let tolerance = 1.0e-3 * (1.0 + color.max_element());
        let shifted = (clamped - color).abs().max_element() > tolerance;

        (clamped.extend(value.w), shifted)
    }
}

#[cfg(test)]
mod tests {
    use glam::{uvec2, vec4};

    use super::*;
    use crate::testing::TestTex;

    const SIZE: UVec2 = UVec2::new(4, 4);

    fn run(slow: Vec4, responsive: Vec4, len: f32) -> HistoryClampingOutput {
        let slow = TestTex::filled(SIZE, slow);
        let responsive = TestTex::filled(SIZE, responsive);
        let history_length =
            TestTex::filled(SIZE, HistoryLength::new(len, len).pack());

        HistoryClamping {
            params: &HistoryClampingPassParams {
                resolution: SIZE,
                color_box_sigma_scale: 2.0,
                specular_max_fast_accumulated_frame_num: 4.0,
                diffuse_max_fast_accumulated_frame_num: 0.0,
                ..Default::default()
            },
            specular: &slow,
            diffuse: &slow,
            specular_responsive: &responsive,
            diffuse_responsive: &responsive,
            history_length: &history_length,
        }
        .run(uvec2(1, 1))
    }

    #[test]
    fn agreeing_histories_are_kept() {
        let out = run(vec4(0.5, 0.5, 0.5, 0.3), vec4(0.5, 0.5, 0.5, 1.0), 30.0);

        assert_eq!(vec4(0.5, 0.5, 0.5, 0.3), out.specular);
        assert_eq!(
            HistoryLength::new(30.0, 30.0),
            HistoryLength::unpack(out.history_length)
        );
    }

    #[test]
    fn lagging_history_is_clamped() {
        let out =
            run(vec4(0.25, 0.25, 0.25, 0.3), vec4(0.75, 0.75, 0.75, 1.0), 30.0);

        assert_eq!(vec4(0.75, 0.75, 0.75, 0.3), out.diffuse);
        assert_eq!(
            HistoryLength::new(4.0, 1.0),
            HistoryLength::unpack(out.history_length)
        );
    }
}

use glam::{ivec2, vec4, IVec2, Vec2, Vec4};

/// 4x4 Catmull-Rom (bicubic) filter.
pub struct CatmullRom;

impl CatmullRom {
    pub fn weights(t: f32) -> Vec4 {
        let t2 = t * t;
        let t3 = t2 * t;

        vec4(
            0.5 * (-t3 + 2.0 * t2 - t),
            0.5 * (3.0 * t3 - 5.0 * t2 + 2.0),
            0.5 * (-3.0 * t3 + 4.0 * t2 + t),
            0.5 * (t3 - t2),
        )
    }

    /// Evaluates the filter for a point located at `origin + frac`, where
    /// `origin` is the top-left tap of the inner 2x2 footprint (as returned
    /// by [`crate::BilinearFilter`]).
    pub fn eval(
        origin: IVec2,
        frac: Vec2,
        sample: impl Fn(IVec2) -> Vec4,
    ) -> Vec4 {
        let wx = Self::weights(frac.x);
        let wy = Self::weights(frac.y);
        let mut out = Vec4::ZERO;
        let mut y = 0;

        while y < 4 {
            let mut x = 0;

            while x < 4 {
                let w = wx[x] * wy[y];

                if w != 0.0 {
                    out += sample(origin + ivec2(x as i32 - 1, y as i32 - 1))
                        * w;
                }

                x += 1;
            }

            y += 1;
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec2;

    use super::*;

    #[test]
    fn weights_sum_to_one() {
        for t in [0.0, 0.25, 0.5, 0.9] {
            assert_relative_eq!(
                1.0,
                CatmullRom::weights(t).dot(Vec4::ONE),
                epsilon = 1.0e-6
            );
        }
    }

    #[test]
    fn zero_offset_returns_origin() {
        let value = CatmullRom::eval(ivec2(4, 4), vec2(0.0, 0.0), |pos| {
            Vec4::splat((pos.x * 10 + pos.y) as f32)
        });

        assert_relative_eq!(44.0, value.x);
    }

    #[test]
    fn linear_ramp_is_reproduced() {
        let value = CatmullRom::eval(ivec2(4, 4), vec2(0.25, 0.0), |pos| {
            Vec4::splat(pos.x as f32)
        });

        assert_relative_eq!(4.25, value.x, epsilon = 1.0e-5);
    }
}

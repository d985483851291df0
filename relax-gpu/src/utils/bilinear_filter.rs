use glam::{ivec2, vec4, IVec2, Vec2, Vec4};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

/// Bilinear footprint of a (sub-pixel) screen-space position, where each of
/// the four taps can be individually rejected.
#[derive(Clone, Copy)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct BilinearFilter {
    /// Pixel of the `f(x=0, y=0)` tap
    pub origin: IVec2,

    /// Position within the footprint, in `0.0..1.0`
    pub frac: Vec2,

    /// Weights for the `f(0, 0)`, `f(1, 0)`, `f(0, 1)` and `f(1, 1)` taps,
    /// with rejected taps zeroed-out
    pub weights: Vec4,

    /// Bitmask of taps that passed the validity check
    pub validity: u32,
}

impl BilinearFilter {
    pub const OFFSETS: [IVec2; 4] =
        [ivec2(0, 0), ivec2(1, 0), ivec2(0, 1), ivec2(1, 1)];

    /// Creates a footprint around `pos`, which is expressed in pixels, with
    /// pixel centers located at `n + 0.5`.
    pub fn new(pos: Vec2, is_valid: impl Fn(IVec2) -> bool) -> Self {
        let pos = pos - 0.5;
        let origin = pos.floor();
        let frac = pos - origin;
        let origin = origin.as_ivec2();

        let mut weights = vec4(
            (1.0 - frac.x) * (1.0 - frac.y),
            frac.x * (1.0 - frac.y),
            (1.0 - frac.x) * frac.y,
            frac.x * frac.y,
        );

        let mut validity = 0;

        if is_valid(origin + Self::OFFSETS[0]) {
            validity |= 0b0001;
        } else {
            weights.x = 0.0;
        }

        if is_valid(origin + Self::OFFSETS[1]) {
            validity |= 0b0010;
        } else {
            weights.y = 0.0;
        }

        if is_valid(origin + Self::OFFSETS[2]) {
            validity |= 0b0100;
        } else {
            weights.z = 0.0;
        }

        if is_valid(origin + Self::OFFSETS[3]) {
            validity |= 0b1000;
        } else {
            weights.w = 0.0;
        }

        Self {
            origin,
            frac,
            weights,
            validity,
        }
    }

    /// Returns the sum of weights of taps that survived; `1.0` means the
    /// entire footprint is valid.
    pub fn footprint(&self) -> f32 {
        self.weights.dot(Vec4::ONE)
    }

    pub fn is_fully_valid(&self) -> bool {
        self.validity == 0b1111
    }

    /// Interpolates samples of valid taps, renormalizing their weights.
    pub fn eval(&self, sample: impl Fn(IVec2) -> Vec4) -> Vec4 {
        let w_sum = self.footprint();

        if w_sum <= 0.0 {
            return Vec4::ZERO;
        }

        let mut out = Vec4::ZERO;

        if self.weights.x > 0.0 {
            out += sample(self.origin + Self::OFFSETS[0]) * self.weights.x;
        }

        if self.weights.y > 0.0 {
            out += sample(self.origin + Self::OFFSETS[1]) * self.weights.y;
        }

        if self.weights.z > 0.0 {
            out += sample(self.origin + Self::OFFSETS[2]) * self.weights.z;
        }

        if self.weights.w > 0.0 {
            out += sample(self.origin + Self::OFFSETS[3]) * self.weights.w;
        }

        out / w_sum
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec2;

    use super::*;

    #[test]
    fn pixel_center_is_exact() {
        let filter = BilinearFilter::new(vec2(3.5, 7.5), |_| true);

        assert_eq!(ivec2(3, 7), filter.origin);
        assert_eq!(vec4(1.0, 0.0, 0.0, 0.0), filter.weights);
        assert_relative_eq!(1.0, filter.footprint());
    }

    #[test]
    fn rejected_taps_are_renormalized() {
        let filter = BilinearFilter::new(vec2(1.0, 1.0), |pos| pos.x == 0);

        assert_eq!(0b0101, filter.validity);
        assert_relative_eq!(0.5, filter.footprint());

        let value = filter.eval(|pos| Vec4::splat(pos.y as f32));

        assert_relative_eq!(0.5, value.x);
    }

    #[test]
    fn fully_rejected() {
        let filter = BilinearFilter::new(vec2(1.0, 1.0), |_| false);

        assert_eq!(0.0, filter.footprint());
        assert_eq!(Vec4::ZERO, filter.eval(|_| Vec4::ONE));
    }
}

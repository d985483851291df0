use glam::{ivec2, uvec2, vec2, IVec2, UVec2, Vec2, Vec4};

/// Read-only access to a 2D RGBA texture.
///
/// Implemented by storage images inside shaders and by the host-side
/// reference executor; every kernel is generic over it.
pub trait TexRead {
    fn load(&self, pos: UVec2) -> Vec4;
}

#[cfg(target_arch = "spirv")]
pub type TexRgba32<'a> =
    &'a spirv_std::Image!(2D, format = rgba32f, sampled = false);

#[cfg(target_arch = "spirv")]
impl TexRead for TexRgba32<'_> {
    fn load(&self, pos: UVec2) -> Vec4 {
        self.read(pos)
    }
}

/// Dimensions of the texture a kernel is run over.
#[derive(Clone, Copy)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct Screen {
    pub size: UVec2,
}

impl Screen {
    pub fn new(size: UVec2) -> Self {
        Self { size }
    }

    pub fn contains(&self, pos: UVec2) -> bool {
        pos.x < self.size.x && pos.y < self.size.y
    }

    pub fn contains_signed(&self, pos: IVec2) -> bool {
        pos.x >= 0
            && pos.y >= 0
            && (pos.x as u32) < self.size.x
            && (pos.y as u32) < self.size.y
    }

    /// Clamps given position to the nearest pixel within the screen.
    pub fn clamp(&self, pos: IVec2) -> UVec2 {
        let max = self.size.as_ivec2() - ivec2(1, 1);

        uvec2(pos.x.clamp(0, max.x) as u32, pos.y.clamp(0, max.y) as u32)
    }

    /// Returns uv of the pixel's center.
    pub fn uv(&self, pos: UVec2) -> Vec2 {
        (pos.as_vec2() + vec2(0.5, 0.5)) / self.size.as_vec2()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains() {
        let screen = Screen::new(uvec2(4, 2));

        assert!(screen.contains(uvec2(3, 1)));
        assert!(!screen.contains(uvec2(4, 1)));
        assert!(!screen.contains_signed(ivec2(-1, 0)));
        assert!(!screen.contains_signed(ivec2(0, 2)));
    }

    #[test]
    fn clamp() {
        let screen = Screen::new(uvec2(4, 2));

        assert_eq!(uvec2(0, 1), screen.clamp(ivec2(-3, 7)));
    }
}

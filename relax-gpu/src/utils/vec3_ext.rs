use glam::{vec3, Vec3};

pub trait Vec3Ext
where
    Self: Sized,
{
    /// Returns luminance of this color-vector.
    fn luma(self) -> f32;

    /// Adjusts luminance of this color-vector.
    ///
    /// Black colors stay black.
    fn with_luma(self, luma: f32) -> Self;
}

impl Vec3Ext for Vec3 {
    fn luma(self) -> f32 {
        self.dot(vec3(0.2126, 0.7152, 0.0722))
    }

    fn with_luma(self, luma: f32) -> Self {
        let curr = self.luma();

        if curr <= 0.0 {
            self
        } else {
            self * (luma / curr)
        }
    }
}

pub trait FloatExt {
    /// Equality up to accumulated rounding: absolute for values near zero,
    /// relative to the larger magnitude otherwise.
    fn rounding_eq(self, other: Self, tolerance: Self) -> bool;
}

impl FloatExt for f32 {
    fn rounding_eq(self, other: Self, tolerance: Self) -> bool {
        let scale = self.abs().max(other.abs()).max(1.0);
        (self - other).abs() <= tolerance * scale
    }
}

impl FloatExt for f64 {
    fn rounding_eq(self, other: Self, tolerance: Self) -> bool {
        let scale = self.abs().max(other.abs()).max(1.0);
        (self - other).abs() <= tolerance * scale
    }
}

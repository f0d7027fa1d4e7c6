use std::ops::{AddAssign, Deref, Index};

/// Row-major 2-D plane of `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer2<T> {
    pixels: Vec<T>,
    width: usize,
    height: usize,
}

impl<T> Buffer2<T> {
    #[inline]
    fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        debug_assert!(x < self.width && y < self.height);
        &mut self.pixels[y * self.width + x]
    }

    /// `(width, height)` pair, handy for shape assertions.
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline]
    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }

    /// Replaces the contents with `pixels`, keeping the dimensions.
    pub fn replace_pixels(&mut self, pixels: Vec<T>) {
        assert_eq!(
            pixels.len(),
            self.pixels.len(),
            "replacement length must equal width * height"
        );
        self.pixels = pixels;
    }
}

impl<T: Default + Clone> Buffer2<T> {
    pub fn new_default(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![T::default(); width * height],
            width,
            height,
        }
    }

    /// Resets every element to `T::default()`.
    pub fn clear(&mut self) {
        self.pixels.fill(T::default());
    }
}

impl<T: Copy + AddAssign> Buffer2<T> {
    /// Elementwise `self += other`. Both planes must have the same dimensions.
    pub fn accumulate(&mut self, other: &Self) {
        assert_eq!(
            self.dimensions(),
            other.dimensions(),
            "cannot accumulate planes of different dimensions"
        );
        for (dst, &src) in self.pixels.iter_mut().zip(other.pixels.iter()) {
            *dst += src;
        }
    }

    /// Adds `value` to the element at `(x, y)`.
    #[inline]
    pub fn add_at(&mut self, x: usize, y: usize, value: T) {
        *self.get_mut(x, y) += value;
    }
}

impl<T> Index<(usize, usize)> for Buffer2<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        &self.pixels[y * self.width + x]
    }
}

impl<T> Deref for Buffer2<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_default_is_zeroed() {
        let buf = Buffer2::<f32>::new_default(3, 2);
        assert_eq!(buf.dimensions(), (3, 2));
        assert_eq!(buf.len(), 6);
        assert!(buf.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_index_is_row_major() {
        // row 0 = [10, 20, 30], row 1 = [40, 50, 60]
        let mut buf = Buffer2::<i32>::new_default(3, 2);
        buf.replace_pixels(vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(buf[(2, 0)], 30);
        assert_eq!(buf[(0, 1)], 40);
        assert_eq!(buf[(2, 1)], 60);
    }

    #[test]
    fn test_accumulate_adds_elementwise() {
        let mut a = Buffer2::<f32>::new_default(2, 2);
        a.replace_pixels(vec![1.0, 2.0, 3.0, 4.0]);
        let mut b = Buffer2::<f32>::new_default(2, 2);
        b.replace_pixels(vec![0.5; 4]);
        a.accumulate(&b);
        assert_eq!(a.pixels(), &[1.5, 2.5, 3.5, 4.5]);
    }

    #[test]
    #[should_panic(expected = "cannot accumulate planes of different dimensions")]
    fn test_accumulate_panics_on_shape_mismatch() {
        let mut a = Buffer2::<f32>::new_default(2, 3);
        let b = Buffer2::<f32>::new_default(3, 2);
        a.accumulate(&b);
    }

    #[test]
    fn test_add_at_and_clear() {
        let mut buf = Buffer2::<f32>::new_default(4, 4);
        buf.add_at(1, 2, 3.0);
        buf.add_at(1, 2, 1.0);
        assert_eq!(buf[(1, 2)], 4.0);

        buf.clear();
        assert!(buf.iter().all(|&v| v == 0.0));
        assert_eq!(buf.dimensions(), (4, 4));
    }

    #[test]
    fn test_replace_pixels_keeps_dimensions() {
        let mut buf = Buffer2::<u8>::new_default(2, 2);
        buf.replace_pixels(vec![1, 2, 3, 4]);
        assert_eq!(buf[(1, 1)], 4);
        assert_eq!(buf.dimensions(), (2, 2));
    }

    #[test]
    #[should_panic(expected = "replacement length must equal width * height")]
    fn test_replace_pixels_rejects_wrong_length() {
        let mut buf = Buffer2::<u8>::new_default(2, 2);
        buf.replace_pixels(vec![1, 2, 3]);
    }
}

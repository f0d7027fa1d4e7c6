//! Reconstruction filters used when splatting samples into image blocks.
//!
//! Filters are separable: the 2-D weight of a pixel is `eval(dx) * eval(dy)`
//! where `dx`, `dy` are the offsets between the pixel center and the sample.

use serde::{Deserialize, Serialize};

/// Kernel shape of a reconstruction filter.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterKind {
    /// Constant weight on the half-open support `(-r, r]`. With radius 0.5
    /// every sample lands in exactly one pixel.
    ///
    /// Other radii give a lopsided footprint: with `r = 1.0` a sample at the
    /// center of pixel `p` covers `p` and `p + 1` but not `p - 1`.
    #[default]
    Box,
    /// Linear falloff to zero at the radius.
    Tent,
    /// Truncated Gaussian, shifted so it reaches zero at the radius.
    Gaussian { stddev: f32 },
}

/// Serializable filter description carried in [`crate::RenderConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(flatten)]
    pub kind: FilterKind,
    pub radius: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            kind: FilterKind::Box,
            radius: 0.5,
        }
    }
}

/// A reconstruction filter. Shared read-only between all blocks of a work result.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructionFilter {
    kind: FilterKind,
    radius: f32,
}

impl ReconstructionFilter {
    pub fn new(kind: FilterKind, radius: f32) -> Self {
        assert!(
            radius.is_finite() && radius > 0.0,
            "filter radius must be positive, got {}",
            radius
        );
        if let FilterKind::Gaussian { stddev } = kind {
            assert!(
                stddev.is_finite() && stddev > 0.0,
                "gaussian stddev must be positive, got {}",
                stddev
            );
        }
        Self { kind, radius }
    }

    /// Single-pixel box filter.
    pub fn pixel_box() -> Self {
        Self::new(FilterKind::Box, 0.5)
    }

    pub fn tent(radius: f32) -> Self {
        Self::new(FilterKind::Tent, radius)
    }

    pub fn gaussian(stddev: f32, radius: f32) -> Self {
        Self::new(FilterKind::Gaussian { stddev }, radius)
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Number of padding pixels a block needs on each side so that samples
    /// near its edge keep their full footprint.
    pub fn border_size(&self) -> u32 {
        (self.radius - 0.5).ceil().max(0.0) as u32
    }

    /// 1-D kernel value at offset `x` from the sample.
    #[inline]
    pub fn eval(&self, x: f32) -> f32 {
        let r = self.radius;
        match self.kind {
            // Half-open (-r, r] so a sample exactly on a pixel edge is counted once.
            FilterKind::Box => {
                if x > -r && x <= r {
                    1.0
                } else {
                    0.0
                }
            }
            FilterKind::Tent => (1.0 - x.abs() / r).max(0.0),
            FilterKind::Gaussian { stddev } => {
                if x.abs() > r {
                    return 0.0;
                }
                let alpha = -1.0 / (2.0 * stddev * stddev);
                ((alpha * x * x).exp() - (alpha * r * r).exp()).max(0.0)
            }
        }
    }
}

impl Default for ReconstructionFilter {
    fn default() -> Self {
        Self::pixel_box()
    }
}

impl From<FilterConfig> for ReconstructionFilter {
    fn from(config: FilterConfig) -> Self {
        Self::new(config.kind, config.radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_is_half_open() {
        let f = ReconstructionFilter::pixel_box();
        assert_eq!(f.eval(0.0), 1.0);
        assert_eq!(f.eval(0.5), 1.0);
        assert_eq!(f.eval(-0.5), 0.0);
        assert_eq!(f.eval(0.75), 0.0);
    }

    #[test]
    fn test_wide_box_keeps_half_open_support() {
        let f = ReconstructionFilter::new(FilterKind::Box, 1.0);
        assert_eq!(f.eval(-1.0), 0.0);
        assert_eq!(f.eval(0.0), 1.0);
        assert_eq!(f.eval(1.0), 1.0);
    }

    #[test]
    fn test_border_sizes() {
        assert_eq!(ReconstructionFilter::pixel_box().border_size(), 0);
        assert_eq!(ReconstructionFilter::tent(1.0).border_size(), 1);
        assert_eq!(ReconstructionFilter::gaussian(0.5, 2.0).border_size(), 2);
    }

    #[test]
    fn test_tent_falloff() {
        let f = ReconstructionFilter::tent(2.0);
        assert!((f.eval(0.0) - 1.0).abs() < f32::EPSILON);
        assert!((f.eval(1.0) - 0.5).abs() < f32::EPSILON);
        assert!((f.eval(-1.0) - 0.5).abs() < f32::EPSILON);
        assert_eq!(f.eval(2.5), 0.0);
    }

    #[test]
    fn test_gaussian_reaches_zero_at_radius() {
        let f = ReconstructionFilter::gaussian(0.5, 2.0);
        assert!(f.eval(0.0) > 0.9);
        assert!(f.eval(2.0).abs() < 1e-6);
        assert_eq!(f.eval(3.0), 0.0);
        assert!((f.eval(0.7) - f.eval(-0.7)).abs() < 1e-7);
    }

    #[test]
    #[should_panic(expected = "filter radius must be positive")]
    fn test_rejects_zero_radius() {
        ReconstructionFilter::new(FilterKind::Box, 0.0);
    }

    #[test]
    fn test_from_config() {
        let config = FilterConfig {
            kind: FilterKind::Tent,
            radius: 1.5,
        };
        let f = ReconstructionFilter::from(config);
        assert_eq!(f.kind(), FilterKind::Tent);
        assert!((f.radius() - 1.5).abs() < f32::EPSILON);
    }
}

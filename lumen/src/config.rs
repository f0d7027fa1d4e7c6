//! Render configuration shared by every worker and the collecting side.
//!
//! Both ends of a transport must hold the same configuration: block size,
//! crop size, light-image flag, maximum depth and diagnostics flag decide the
//! byte layout of a serialized [`crate::WorkResult`].

use std::path::Path;

use glam::UVec2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::filter::{FilterConfig, ReconstructionFilter};
use crate::strategy::strategy_count;

/// Configuration of the accumulation targets of one render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Edge length of a square tile, in pixels.
    pub block_size: u32,
    /// Size of the full frame (the crop window of the film).
    pub crop_size: UVec2,
    /// Allocate a full-frame light image for strategies that splat anywhere.
    pub light_image: bool,
    /// Largest strategy depth `k = s + t - 2` tracked by the diagnostic images.
    pub max_depth: u32,
    /// Samples per pixel. Only used to scale exported diagnostic images.
    pub sample_count: u32,
    /// Keep one full-frame image pair per sampling strategy.
    pub debug_strategies: bool,
    /// Reconstruction filter for every block.
    pub filter: FilterConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            block_size: 32,
            crop_size: UVec2::new(256, 256),
            light_image: true,
            max_depth: 5,
            sample_count: 16,
            debug_strategies: false,
            filter: FilterConfig::default(),
        }
    }
}

impl RenderConfig {
    /// Load a YAML or JSON configuration, picked by file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = common::SerdeFormat::from_path(path)?;
        let text = std::fs::read_to_string(path).map_err(|e| Error::ReadConfig {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: RenderConfig = common::deserialize(&text, format)?;
        config.validate()?;

        tracing::info!(
            path = %path.display(),
            block_size = config.block_size,
            crop_width = config.crop_size.x,
            crop_height = config.crop_size.y,
            light_image = config.light_image,
            max_depth = config.max_depth,
            "Loaded render config"
        );

        Ok(config)
    }

    /// Check the ranges the builders assert on, for configs that came from a file.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(Error::InvalidConfig("block_size must be > 0".into()));
        }
        if self.crop_size.x == 0 || self.crop_size.y == 0 {
            return Err(Error::InvalidConfig(format!(
                "crop_size must be non-zero, got {}x{}",
                self.crop_size.x, self.crop_size.y
            )));
        }
        if self.sample_count == 0 {
            return Err(Error::InvalidConfig("sample_count must be > 0".into()));
        }
        if !(self.filter.radius.is_finite() && self.filter.radius > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "filter radius must be positive, got {}",
                self.filter.radius
            )));
        }
        if let crate::filter::FilterKind::Gaussian { stddev } = self.filter.kind {
            if !(stddev.is_finite() && stddev > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "gaussian stddev must be positive, got {}",
                    stddev
                )));
            }
        }
        if self.block_size > self.crop_size.x.max(self.crop_size.y) {
            tracing::warn!(
                block_size = self.block_size,
                crop_width = self.crop_size.x,
                crop_height = self.crop_size.y,
                "Block size exceeds the crop size"
            );
        }
        Ok(())
    }

    pub fn with_block_size(mut self, block_size: u32) -> Self {
        assert!(block_size > 0, "block_size must be > 0");
        self.block_size = block_size;
        self
    }

    pub fn with_crop_size(mut self, crop_size: UVec2) -> Self {
        assert!(
            crop_size.x > 0 && crop_size.y > 0,
            "crop_size must be non-zero"
        );
        self.crop_size = crop_size;
        self
    }

    pub fn with_light_image(mut self, light_image: bool) -> Self {
        self.light_image = light_image;
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_sample_count(mut self, sample_count: u32) -> Self {
        assert!(sample_count > 0, "sample_count must be > 0");
        self.sample_count = sample_count;
        self
    }

    pub fn with_debug_strategies(mut self, enabled: bool) -> Self {
        self.debug_strategies = enabled;
        self
    }

    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filter = filter;
        self
    }

    /// Default tile dimensions.
    pub fn block_dimensions(&self) -> UVec2 {
        UVec2::splat(self.block_size)
    }

    /// Number of strategy slots `D`, or 0 when diagnostics are off.
    pub fn strategy_slots(&self) -> usize {
        if self.debug_strategies {
            strategy_count(self.max_depth as usize)
        } else {
            0
        }
    }

    pub fn reconstruction_filter(&self) -> ReconstructionFilter {
        ReconstructionFilter::from(self.filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterKind;

    #[test]
    fn test_default_config() {
        let config = RenderConfig::default();
        assert_eq!(config.block_size, 32);
        assert_eq!(config.crop_size, UVec2::new(256, 256));
        assert!(config.light_image);
        assert!(!config.debug_strategies);
        assert_eq!(config.strategy_slots(), 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = RenderConfig::default()
            .with_block_size(16)
            .with_crop_size(UVec2::new(640, 480))
            .with_light_image(false)
            .with_max_depth(0)
            .with_debug_strategies(true);

        assert_eq!(config.block_dimensions(), UVec2::splat(16));
        assert_eq!(config.crop_size, UVec2::new(640, 480));
        assert!(!config.light_image);
        assert_eq!(config.strategy_slots(), 3);
    }

    #[test]
    #[should_panic(expected = "block_size must be > 0")]
    fn test_builder_rejects_zero_block() {
        RenderConfig::default().with_block_size(0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = RenderConfig::default();
        config.crop_size = UVec2::new(0, 10);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = RenderConfig::default();
        config.filter = FilterConfig {
            kind: FilterKind::Gaussian { stddev: 0.0 },
            radius: 2.0,
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_yaml_uses_defaults_for_missing_fields() {
        let yaml = concat!(
            "block_size: 64\n",
            "light_image: false\n",
            "filter:\n",
            "  type: gaussian\n",
            "  stddev: 0.5\n",
            "  radius: 2.0\n",
        );
        let config: RenderConfig = common::deserialize(yaml, common::SerdeFormat::Yaml).unwrap();
        assert_eq!(config.block_size, 64);
        assert!(!config.light_image);
        assert_eq!(config.crop_size, UVec2::new(256, 256));
        assert_eq!(config.filter.kind, FilterKind::Gaussian { stddev: 0.5 });
        assert!((config.filter.radius - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_from_file_json() {
        let path = common::test_utils::test_output_dir("config_from_file_json").join("render.json");
        let config = RenderConfig::default()
            .with_block_size(8)
            .with_debug_strategies(true);
        let text = common::serialize(&config, common::SerdeFormat::Json).unwrap();
        std::fs::write(&path, text).unwrap();

        let loaded = RenderConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_from_file_errors() {
        assert!(matches!(
            RenderConfig::from_file("render.toml"),
            Err(Error::ConfigFormat(_))
        ));
        assert!(matches!(
            RenderConfig::from_file("/nonexistent/dir/render.yaml"),
            Err(Error::ReadConfig { .. })
        ));

        let path = common::test_utils::test_output_dir("config_from_file_errors").join("bad.yaml");
        std::fs::write(&path, "block_size: 0\n").unwrap();
        assert!(matches!(
            RenderConfig::from_file(&path),
            Err(Error::InvalidConfig(_))
        ));
    }
}

//! Per-worker accumulation targets of a bidirectional render.
//!
//! Each rendering thread splats into a small tile (the camera image) and,
//! since light-subpath strategies can reach any pixel, into a full-resolution
//! light image. With diagnostics on, every sampling strategy additionally gets
//! its own pair of full-frame images.
//!
//! A [`WorkResult`] is owned by one worker at a time and has no internal
//! locking. Results are combined with [`WorkResult::put`], which is plain
//! elementwise addition, so partial results can be folded in any order.
//!
//! # Stream layout
//!
//! [`WorkResult::save`] and [`WorkResult::load`] use a fixed field order with
//! no framing:
//!
//! 1. the MIS-weighted strategy images, in strategy-index order (diagnostics only),
//! 2. the light image (only when enabled),
//! 3. the tile.
//!
//! Whether the light image and the strategy images are present is not
//! encoded; both ends derive it from the shared [`RenderConfig`].

use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use glam::{IVec2, UVec2, Vec2};

use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::filter::ReconstructionFilter;
use crate::image_block::{ImageBlock, PixelFormat, Spectrum, StagedPayload};
use crate::strategy::{Strategy, strategy_at, strategy_index};

mod dump;

/// Full-frame images of a single sampling strategy.
#[derive(Debug, Clone)]
pub struct StrategyImages {
    /// Contributions after multiple importance sampling.
    pub weighted: ImageBlock,
    /// Raw contributions, before MIS weighting. Local only, never transported.
    pub unweighted: ImageBlock,
}

impl StrategyImages {
    fn new(crop_size: UVec2, filter: &Arc<ReconstructionFilter>) -> Self {
        Self {
            weighted: ImageBlock::new(PixelFormat::Spectrum, crop_size, filter.clone()),
            unweighted: ImageBlock::new(PixelFormat::Spectrum, crop_size, filter.clone()),
        }
    }

    fn clear(&mut self) {
        self.weighted.clear();
        self.unweighted.clear();
    }

    fn put(&mut self, other: &StrategyImages) {
        self.weighted.put(&other.weighted);
        self.unweighted.put(&other.unweighted);
    }
}

/// Accumulated output of one worker: tile, optional light image and optional
/// per-strategy images.
#[derive(Debug, Clone)]
pub struct WorkResult {
    block: ImageBlock,
    light_image: Option<ImageBlock>,
    strategies: Vec<StrategyImages>,
}

impl WorkResult {
    /// Allocate the targets described by `config`.
    ///
    /// `block_size` overrides the configured square tile size.
    pub fn new(
        config: &RenderConfig,
        filter: Arc<ReconstructionFilter>,
        block_size: Option<UVec2>,
    ) -> Self {
        let block_size = block_size.unwrap_or_else(|| config.block_dimensions());

        let mut block =
            ImageBlock::new(PixelFormat::SpectrumAlphaWeight, block_size, filter.clone());
        block.set_offset(IVec2::ZERO);

        let light_image = config
            .light_image
            .then(|| ImageBlock::new(PixelFormat::Spectrum, config.crop_size, filter.clone()));

        let strategies: Vec<StrategyImages> = (0..config.strategy_slots())
            .map(|_| StrategyImages::new(config.crop_size, &filter))
            .collect();

        tracing::debug!(
            block_width = block_size.x,
            block_height = block_size.y,
            light_image = light_image.is_some(),
            strategy_slots = strategies.len(),
            "Allocated work result"
        );

        Self {
            block,
            light_image,
            strategies,
        }
    }

    /// Build from a config, using its own reconstruction filter.
    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(config, Arc::new(config.reconstruction_filter()), None)
    }

    /// Zero every target. Shapes and the tile offset are kept.
    pub fn clear(&mut self) {
        for images in self.strategies.iter_mut() {
            images.clear();
        }
        if let Some(light) = self.light_image.as_mut() {
            light.clear();
        }
        self.block.clear();
    }

    /// Accumulate `other` into this result.
    ///
    /// # Panics
    ///
    /// Panics if the two results were not built from the same configuration
    /// (tile shape, light image presence, strategy count).
    pub fn put(&mut self, other: &WorkResult) {
        assert_eq!(
            self.strategies.len(),
            other.strategies.len(),
            "strategy image count mismatch"
        );
        for (dst, src) in self.strategies.iter_mut().zip(other.strategies.iter()) {
            dst.put(src);
        }

        self.block.put(&other.block);

        match (self.light_image.as_mut(), other.light_image.as_ref()) {
            (Some(dst), Some(src)) => dst.put(src),
            (None, None) => {}
            _ => panic!("light image presence mismatch"),
        }
    }

    /// Splat a camera-subpath contribution into the tile with unit weight.
    #[inline]
    pub fn put_sample(&mut self, pos: Vec2, value: Spectrum) -> bool {
        self.block.put_sample(pos, value, 1.0)
    }

    /// Splat a light-subpath contribution anywhere in the frame.
    ///
    /// Returns `false` without touching anything when the light image is
    /// disabled.
    #[inline]
    pub fn put_light_sample(&mut self, pos: Vec2, value: Spectrum) -> bool {
        match self.light_image.as_mut() {
            Some(light) => light.put_sample(pos, value, 1.0),
            None => {
                tracing::trace!(?pos, "Light image disabled, dropping light sample");
                false
            }
        }
    }

    /// Record the MIS-weighted contribution of strategy `(s, t)`.
    /// No-op when diagnostics are disabled.
    pub fn put_debug_sample(&mut self, s: usize, t: usize, pos: Vec2, value: Spectrum) -> bool {
        match self.strategy_slot_mut(s, t) {
            Some(images) => images.weighted.put_sample(pos, value, 1.0),
            None => false,
        }
    }

    /// Record the unweighted contribution of strategy `(s, t)`.
    /// No-op when diagnostics are disabled.
    pub fn put_debug_sample_unweighted(
        &mut self,
        s: usize,
        t: usize,
        pos: Vec2,
        value: Spectrum,
    ) -> bool {
        match self.strategy_slot_mut(s, t) {
            Some(images) => images.unweighted.put_sample(pos, value, 1.0),
            None => false,
        }
    }

    fn strategy_slot_mut(&mut self, s: usize, t: usize) -> Option<&mut StrategyImages> {
        if self.strategies.is_empty() {
            return None;
        }
        let index = strategy_index(s, t);
        let slots = self.strategies.len();
        assert!(
            index < slots,
            "strategy (s={}, t={}) maps to index {} beyond {} slots",
            s,
            t,
            index,
            slots
        );
        Some(&mut self.strategies[index])
    }

    pub fn image_block(&self) -> &ImageBlock {
        &self.block
    }

    pub fn light_image(&self) -> Option<&ImageBlock> {
        self.light_image.as_ref()
    }

    pub fn has_light_image(&self) -> bool {
        self.light_image.is_some()
    }

    /// Number of strategy slots, 0 when diagnostics are disabled.
    pub fn strategy_slots(&self) -> usize {
        self.strategies.len()
    }

    /// Images of strategy `(s, t)`, if diagnostics are enabled and it is in range.
    pub fn strategy_images(&self, s: usize, t: usize) -> Option<&StrategyImages> {
        if self.strategies.is_empty() || s + t < 2 {
            return None;
        }
        self.strategies.get(strategy_index(s, t))
    }

    /// All strategy images with their strategy, in index order.
    pub fn iter_strategies(&self) -> impl Iterator<Item = (Strategy, &StrategyImages)> {
        self.strategies
            .iter()
            .enumerate()
            .map(|(i, images)| (strategy_at(i), images))
    }

    /// Move the tile. The light and strategy images never move.
    pub fn set_offset(&mut self, offset: IVec2) {
        self.block.set_offset(offset);
    }

    /// Resize the tile, e.g. for partial tiles at the frame edge.
    pub fn set_size(&mut self, size: UVec2) {
        self.block.set_size(size);
    }

    /// Exact number of bytes [`WorkResult::save`] writes.
    pub fn payload_len(&self) -> usize {
        let strategies: usize = self
            .strategies
            .iter()
            .map(|images| images.weighted.payload_len())
            .sum();
        let light = self.light_image.as_ref().map_or(0, ImageBlock::payload_len);
        strategies + light + self.block.payload_len()
    }

    /// Serialize to `writer` in the fixed stream order.
    pub fn save<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        for (i, images) in self.strategies.iter().enumerate() {
            images
                .weighted
                .save(writer)
                .map_err(|e| Error::StreamWrite {
                    what: strategy_label(i),
                    source: e,
                })?;
        }

        if let Some(light) = self.light_image.as_ref() {
            light.save(writer).map_err(|e| Error::StreamWrite {
                what: "light image".into(),
                source: e,
            })?;
        }

        self.block.save(writer).map_err(|e| Error::StreamWrite {
            what: "tile".into(),
            source: e,
        })?;

        tracing::debug!(bytes = self.payload_len(), "Saved work result");
        Ok(())
    }

    /// Replace the contents with a stream written by [`WorkResult::save`] on
    /// an identically configured result.
    ///
    /// Everything is read before anything is written, so on error this
    /// result is left unchanged.
    pub fn load<R: Read + ?Sized>(&mut self, reader: &mut R) -> Result<()> {
        let mut staged_strategies: Vec<StagedPayload> = Vec::with_capacity(self.strategies.len());
        for (i, images) in self.strategies.iter().enumerate() {
            let payload = images
                .weighted
                .read_payload(reader)
                .map_err(|e| Error::StreamRead {
                    what: strategy_label(i),
                    source: e,
                })?;
            staged_strategies.push(payload);
        }

        let staged_light = match self.light_image.as_ref() {
            Some(light) => {
                let payload = light.read_payload(reader).map_err(|e| Error::StreamRead {
                    what: "light image".into(),
                    source: e,
                })?;
                Some(payload)
            }
            None => None,
        };

        let staged_block = self.block.read_payload(reader).map_err(|e| Error::StreamRead {
            what: "tile".into(),
            source: e,
        })?;

        for (images, payload) in self.strategies.iter_mut().zip(staged_strategies) {
            images.weighted.commit_payload(payload);
        }
        if let (Some(light), Some(payload)) = (self.light_image.as_mut(), staged_light) {
            light.commit_payload(payload);
        }
        self.block.commit_payload(staged_block);

        tracing::debug!(bytes = self.payload_len(), "Loaded work result");
        Ok(())
    }

    /// Serialize into a freshly allocated buffer of exactly
    /// [`WorkResult::payload_len`] bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(self.payload_len());
        self.save(&mut bytes)?;
        Ok(bytes)
    }

    /// Load from a buffer that must hold exactly one serialized result.
    pub fn load_from_slice(&mut self, bytes: &[u8]) -> Result<()> {
        let expected = self.payload_len();
        if bytes.len() != expected {
            return Err(Error::PayloadLength {
                expected,
                actual: bytes.len(),
            });
        }
        let mut reader = bytes;
        self.load(&mut reader)
    }
}

fn strategy_label(index: usize) -> String {
    let strategy = strategy_at(index);
    format!("strategy image s={} t={}", strategy.s, strategy.t)
}

impl fmt::Display for WorkResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorkResult[block={}", self.block)?;
        if let Some(light) = self.light_image.as_ref() {
            write!(f, ", light={}x{}", light.size().x, light.size().y)?;
        }
        if !self.strategies.is_empty() {
            write!(f, ", strategies={}", self.strategies.len())?;
        }
        write!(f, "]")
    }
}

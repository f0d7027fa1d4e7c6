//! Lumen - per-worker film accumulation for bidirectional light transport.
//!
//! A [`WorkResult`] bundles everything one rendering thread writes into:
//! - a small tile for camera-subpath contributions,
//! - an optional full-frame light image for light-subpath contributions,
//! - optional per-strategy diagnostic images.
//!
//! Results from different workers are added with [`WorkResult::put`] or
//! [`reduce_work_results`], and moved between processes as a flat
//! little-endian byte stream with [`WorkResult::save`] / [`WorkResult::load`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lumen::{RenderConfig, WorkResult};
//! use glam::{Vec3, vec2};
//!
//! let config = RenderConfig::from_file("render.yaml")?;
//! let mut result = WorkResult::from_config(&config);
//!
//! result.put_sample(vec2(5.5, 5.5), Vec3::ONE);
//! result.put_light_sample(vec2(200.5, 200.5), Vec3::X);
//!
//! let bytes = result.to_bytes()?;
//! let mut remote = WorkResult::from_config(&config);
//! remote.load_from_slice(&bytes)?;
//! ```

mod config;
mod error;
pub mod filter;
mod image_block;
mod reduce;
pub mod strategy;
mod work_result;

// ============================================================================
// Configuration and errors
// ============================================================================

pub use config::RenderConfig;
pub use error::{Error, Result};

// ============================================================================
// Image blocks
// ============================================================================

pub use filter::{FilterConfig, FilterKind, ReconstructionFilter};
pub use image_block::{ImageBlock, MAX_CHANNELS, PixelFormat, Spectrum, StagedPayload};

// ============================================================================
// Strategies
// ============================================================================

pub use strategy::{Strategy, strategies, strategy_at, strategy_count, strategy_index};

// ============================================================================
// Work results
// ============================================================================

pub use reduce::{fold_work_results, reduce_work_results};
pub use work_result::{StrategyImages, WorkResult};

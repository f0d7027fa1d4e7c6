//! Export of the per-strategy diagnostic images.

use std::path::{Path, PathBuf};

use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::image_block::ImageBlock;
use crate::strategy::strategies_of_depth;

use super::WorkResult;

impl WorkResult {
    /// Write the contribution of every sampling strategy as an EXR image.
    ///
    /// For each depth `k` this writes one image per strategy with a non-zero
    /// contribution (`{stem}_k{k}_s{s}_t{t}.exr`), the sum of that depth's
    /// strategies (`{stem}_k{k}.exr`), and the non-zero unweighted images
    /// (`{stem}_nm_k{k}_s{s}_t{t}.exr`). Values are scaled by
    /// `1 / sample_count`. Returns the written paths; nothing is written when
    /// diagnostics are disabled.
    pub fn dump(&self, config: &RenderConfig, prefix: &Path, stem: &str) -> Result<Vec<PathBuf>> {
        let Some(first) = self.strategies.first() else {
            return Ok(Vec::new());
        };

        std::fs::create_dir_all(prefix).map_err(|e| Error::CreateExportDir {
            path: prefix.to_path_buf(),
            source: e,
        })?;

        let scale = 1.0 / config.sample_count.max(1) as f32;
        let mut depth_sum = first.weighted.clone();
        let mut written = Vec::new();

        let mut k = 0;
        while crate::strategy::depth_offset(k + 1) <= self.strategies.len() {
            depth_sum.clear();

            for strategy in strategies_of_depth(k) {
                let images = &self.strategies[strategy.index()];
                if images.weighted.is_black() {
                    continue;
                }
                depth_sum.put(&images.weighted);
                let path = prefix.join(format!(
                    "{}_k{:02}_s{:02}_t{:02}.exr",
                    stem, k, strategy.s, strategy.t
                ));
                write_exr(&images.weighted, scale, &path)?;
                written.push(path);
            }

            let path = prefix.join(format!("{}_k{:02}.exr", stem, k));
            write_exr(&depth_sum, scale, &path)?;
            written.push(path);

            for strategy in strategies_of_depth(k) {
                let images = &self.strategies[strategy.index()];
                if images.unweighted.is_black() {
                    continue;
                }
                let path = prefix.join(format!(
                    "{}_nm_k{:02}_s{:02}_t{:02}.exr",
                    stem, k, strategy.s, strategy.t
                ));
                write_exr(&images.unweighted, scale, &path)?;
                written.push(path);
            }

            k += 1;
        }

        tracing::info!(
            dir = %prefix.display(),
            stem,
            files = written.len(),
            "Exported strategy images"
        );

        Ok(written)
    }
}

fn write_exr(block: &ImageBlock, scale: f32, path: &Path) -> Result<()> {
    block
        .to_rgb32f(scale)
        .save(path)
        .map_err(|e| Error::ExportImage {
            path: path.to_path_buf(),
            source: e,
        })
}

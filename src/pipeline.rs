//! End-to-end compression and decompression.
//!
//! ```text
//! Grid ─ partition ─> blocks ─ LBG ─> Codebook
//!                        └──── encode ──┴─> CodedStream
//!
//! CodedStream + Codebook ─ decode ─> blocks ─ assemble ─> Grid ─ mse
//! ```
//!
//! All parameters are checked before any work starts. Decoding needs the
//! original width, height and block size again because neither the stream
//! nor the codebook records them.

use crate::error::{Result, VqError};
use crate::grid::Grid;
use crate::metrics::{self, CompressionReport, ReportParams};
use crate::partition;
use crate::persistence;
use crate::quantization::{
    codec, CodedStream, Codebook, DecodeStats, LbgParams, LbgTrainer, StopReason,
};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Compression parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressParams {
    /// Side length of the square tiles.
    pub block_size: usize,
    /// Requested number of codebook entries (rounded up to a power of two).
    pub codebook_size: usize,
    /// LBG training knobs.
    pub lbg: LbgParams,
    /// Sample widths used in the compression report.
    pub report: ReportParams,
}

impl Default for CompressParams {
    fn default() -> Self {
        Self {
            block_size: 4,
            codebook_size: 64,
            lbg: LbgParams::default(),
            report: ReportParams::default(),
        }
    }
}

impl CompressParams {
    /// Validate parameters that do not depend on the image.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(VqError::InvalidParameter(
                "block size must be greater than 0".to_string(),
            ));
        }
        if self.codebook_size == 0 {
            return Err(VqError::InvalidParameter(
                "codebook size must be greater than 0".to_string(),
            ));
        }
        self.lbg.validate()
    }

    /// Validate against a concrete grid: the block must fit inside it.
    pub fn validate_for(&self, grid: &Grid) -> Result<()> {
        self.validate()?;
        check_block_fits(self.block_size, grid.width(), grid.height())
    }
}

/// Parameters needed to rebuild a grid from a coded stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeParams {
    pub width: usize,
    pub height: usize,
    pub block_size: usize,
}

impl DecodeParams {
    pub fn new(width: usize, height: usize, block_size: usize) -> Self {
        Self {
            width,
            height,
            block_size,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(VqError::InvalidParameter(format!(
                "grid dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.block_size == 0 {
            return Err(VqError::InvalidParameter(
                "block size must be greater than 0".to_string(),
            ));
        }
        check_block_fits(self.block_size, self.width, self.height)
    }
}

fn check_block_fits(block_size: usize, width: usize, height: usize) -> Result<()> {
    if block_size > width.min(height) {
        return Err(VqError::InvalidParameter(format!(
            "block size {block_size} exceeds grid {width}x{height}"
        )));
    }
    Ok(())
}

/// Output of [`VqCompressor::compress`].
#[derive(Debug, Clone)]
pub struct Compressed {
    pub codebook: Codebook,
    pub stream: CodedStream,
    pub report: CompressionReport,
    /// How LBG relaxation ended.
    pub stop: StopReason,
    /// Mean squared block-to-centroid distance after training.
    pub distortion: f64,
}

/// Output of [`VqCompressor::decompress`].
#[derive(Debug, Clone)]
pub struct Decompressed {
    pub grid: Grid,
    pub stats: DecodeStats,
}

/// Grayscale VQ compressor.
#[derive(Debug, Clone)]
pub struct VqCompressor {
    params: CompressParams,
}

impl VqCompressor {
    pub fn new(params: CompressParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &CompressParams {
        &self.params
    }

    /// Partition, train and encode `grid`.
    ///
    /// Repair randomness comes from `params.lbg.seed`, or OS entropy when unset.
    pub fn compress(&self, grid: &Grid) -> Result<Compressed> {
        let seed = self.params.lbg.seed.unwrap_or_else(|| rand::rng().random());
        self.compress_with_rng(grid, &mut StdRng::seed_from_u64(seed))
    }

    /// [`compress`](Self::compress) with an explicit random source.
    pub fn compress_with_rng<R: Rng + ?Sized>(
        &self,
        grid: &Grid,
        rng: &mut R,
    ) -> Result<Compressed> {
        self.params.validate_for(grid)?;

        let blocks = partition::partition(grid, self.params.block_size)?;
        let trainer = LbgTrainer::with_params(self.params.codebook_size, self.params.lbg.clone())?;
        let training = trainer.train(&blocks, rng)?;
        let stream = codec::encode(&blocks, &training.codebook);
        let report = CompressionReport::new(
            grid.width(),
            grid.height(),
            self.params.block_size,
            &training.codebook,
            &stream,
            &self.params.report,
        );

        tracing::info!(
            width = grid.width(),
            height = grid.height(),
            blocks = blocks.len(),
            entries = training.codebook.len(),
            index_bits = training.codebook.index_bits(),
            ratio = ?report.compression_ratio,
            "compressed image"
        );

        Ok(Compressed {
            codebook: training.codebook,
            stream,
            report,
            stop: training.stop,
            distortion: training.distortion,
        })
    }

    /// Compress and persist codebook and stream to the given paths.
    ///
    /// Each file is written atomically but the pair is not. If the stream
    /// cannot be saved, the freshly written codebook is removed again so no
    /// new codebook is left beside a stale or missing stream.
    pub fn compress_to_files(
        &self,
        grid: &Grid,
        codebook_path: impl AsRef<Path>,
        stream_path: impl AsRef<Path>,
    ) -> Result<Compressed> {
        let codebook_path = codebook_path.as_ref();
        let compressed = self.compress(grid)?;
        persistence::save_codebook(&compressed.codebook, codebook_path)?;
        if let Err(e) = persistence::save_stream(&compressed.stream, stream_path) {
            if let Err(cleanup) = std::fs::remove_file(codebook_path) {
                tracing::warn!(
                    path = %codebook_path.display(),
                    error = %cleanup,
                    "failed to remove codebook after stream save failed"
                );
            }
            return Err(e.into());
        }
        Ok(compressed)
    }

    /// Rebuild a grid from a codebook and coded stream.
    ///
    /// Unknown indices decode to zero blocks (counted in
    /// [`DecodeStats::missing`]). An empty codebook has nothing to decode and
    /// yields a zero grid.
    pub fn decompress(
        codebook: &Codebook,
        stream: &CodedStream,
        params: &DecodeParams,
    ) -> Result<Decompressed> {
        params.validate()?;

        if codebook.is_empty() {
            tracing::warn!(
                blocks = stream.len(),
                "codebook is empty; nothing to decode"
            );
            return Ok(Decompressed {
                grid: Grid::new(params.width, params.height),
                stats: DecodeStats {
                    decoded: 0,
                    missing: stream.len(),
                },
            });
        }

        let (grid, stats) = codec::reconstruct(
            stream,
            codebook,
            params.width,
            params.height,
            params.block_size,
        )?;
        tracing::info!(
            width = params.width,
            height = params.height,
            decoded = stats.decoded,
            missing = stats.missing,
            "reconstructed image"
        );
        Ok(Decompressed { grid, stats })
    }

    /// Load codebook and stream from disk and rebuild the grid.
    pub fn decompress_from_files(
        codebook_path: impl AsRef<Path>,
        stream_path: impl AsRef<Path>,
        params: &DecodeParams,
    ) -> Result<Decompressed> {
        params.validate()?;
        let codebook = persistence::load_codebook(codebook_path)?;
        let stream = persistence::load_stream(stream_path)?;
        Self::decompress(&codebook, &stream, params)
    }

    /// Decompress and measure the MSE against `original`.
    pub fn decompress_and_compare(
        codebook: &Codebook,
        stream: &CodedStream,
        params: &DecodeParams,
        original: &Grid,
    ) -> Result<(Decompressed, f64)> {
        if original.dimensions() != (params.width, params.height) {
            return Err(VqError::DimensionMismatch {
                expected: format!("{}x{} grid", params.width, params.height),
                actual: format!("{}x{} grid", original.width(), original.height()),
            });
        }
        let decompressed = Self::decompress(codebook, stream, params)?;
        let mse = metrics::mse(original, &decompressed.grid)?;
        tracing::info!(mse, "reconstruction error");
        Ok((decompressed, mse))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(block_size: usize, codebook_size: usize) -> CompressParams {
        CompressParams {
            block_size,
            codebook_size,
            lbg: LbgParams {
                seed: Some(42),
                ..LbgParams::default()
            },
            ..CompressParams::default()
        }
    }

    #[test]
    fn rejects_block_larger_than_grid() {
        let vq = VqCompressor::new(params(8, 4)).unwrap();
        let err = vq.compress(&Grid::new(6, 16)).unwrap_err();
        assert!(matches!(err, VqError::InvalidParameter(_)));
    }

    #[test]
    fn rejects_zero_sizes_up_front() {
        assert!(VqCompressor::new(params(0, 4)).is_err());
        assert!(VqCompressor::new(params(4, 0)).is_err());
        assert!(DecodeParams::new(0, 8, 4).validate().is_err());
        assert!(DecodeParams::new(8, 8, 9).validate().is_err());
        assert!(DecodeParams::new(8, 8, 8).validate().is_ok());
    }

    #[test]
    fn all_zero_scenario() {
        let grid = Grid::new(8, 8);
        let vq = VqCompressor::new(params(4, 2)).unwrap();
        let out = vq.compress(&grid).unwrap();

        assert_eq!(out.codebook.len(), 2);
        assert!(out
            .codebook
            .centroids()
            .iter()
            .all(|c| c.len() == 16 && c.iter().all(|&v| v == 0.0)));
        assert_eq!(out.stream.indices(), &["0", "0", "0", "0"]);

        let (dec, mse) = VqCompressor::decompress_and_compare(
            &out.codebook,
            &out.stream,
            &DecodeParams::new(8, 8, 4),
            &grid,
        )
        .unwrap();
        assert_eq!(dec.grid, grid);
        assert_eq!(mse, 0.0);
    }

    #[test]
    fn empty_codebook_decodes_to_blank_grid() {
        let dec = VqCompressor::decompress(
            &Codebook::empty(2),
            &CodedStream::default(),
            &DecodeParams::new(4, 4, 2),
        )
        .unwrap();
        assert_eq!(dec.grid, Grid::new(4, 4));
    }

    #[test]
    fn compare_rejects_shape_mismatch() {
        let cb = Codebook::new(0, vec![vec![1.0; 4]]).unwrap();
        let err = VqCompressor::decompress_and_compare(
            &cb,
            &CodedStream::default(),
            &DecodeParams::new(4, 4, 2),
            &Grid::new(4, 5),
        )
        .unwrap_err();
        assert!(matches!(err, VqError::DimensionMismatch { .. }));
    }

    #[test]
    fn failed_stream_save_removes_codebook() {
        let dir = tempfile::tempdir().unwrap();
        let codebook_path = dir.path().join("codebook.json");
        let stream_path = dir.path().join("missing").join("stream.txt");

        let vq = VqCompressor::new(params(4, 2)).unwrap();
        let err = vq
            .compress_to_files(&Grid::new(8, 8), &codebook_path, &stream_path)
            .unwrap_err();
        assert!(matches!(err, VqError::Persistence(_)));
        assert!(!codebook_path.exists());
        assert!(!stream_path.exists());
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let p: CompressParams = serde_json::from_str(r#"{"block_size": 8}"#).unwrap();
        assert_eq!(p.block_size, 8);
        assert_eq!(p.codebook_size, 64);
        assert_eq!(p.lbg, LbgParams::default());
    }
}

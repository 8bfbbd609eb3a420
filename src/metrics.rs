//! Reconstruction quality and storage accounting.
//!
//! - Mean squared error between an original and a reconstructed grid
//! - Storage sizes of the image, the coded stream and the codebook
//! - Compression ratio: original bits / (stream bits + codebook bits)

use crate::error::{Result, VqError};
use crate::grid::Grid;
use crate::quantization::{CodedStream, Codebook};
use serde::{Deserialize, Serialize};

/// Mean of squared per-sample differences between two equal-shape grids.
///
/// mse = Σ (a - b)² / (W × H)
///
/// Symmetric in its arguments and exactly `0.0` for identical grids. Two
/// empty grids of the same shape also give `0.0`.
pub fn mse(original: &Grid, reconstructed: &Grid) -> Result<f64> {
    if original.dimensions() != reconstructed.dimensions() {
        let (w, h) = original.dimensions();
        let (rw, rh) = reconstructed.dimensions();
        return Err(VqError::DimensionMismatch {
            expected: format!("{w}x{h} grid"),
            actual: format!("{rw}x{rh} grid"),
        });
    }
    if original.is_empty() {
        return Ok(0.0);
    }

    let total: u64 = original
        .samples()
        .iter()
        .zip(reconstructed.samples())
        .map(|(&a, &b)| {
            let d = u64::from(a.abs_diff(b));
            d * d
        })
        .sum();

    Ok(total as f64 / original.samples().len() as f64)
}

/// Raw image size in bits: `W × H × bits_per_pixel`.
#[inline]
pub fn image_size_bits(width: usize, height: usize, bits_per_pixel: u32) -> u64 {
    width as u64 * height as u64 * u64::from(bits_per_pixel)
}

/// Codebook storage estimate in bits: `entries × b² × bits_per_sample`.
#[inline]
pub fn codebook_storage_bits(entries: usize, block_size: usize, bits_per_sample: u32) -> u64 {
    let b = block_size as u64;
    (entries as u64)
        .saturating_mul(b.saturating_mul(b))
        .saturating_mul(u64::from(bits_per_sample))
}

/// `original_bits / (stream_bits + codebook_bits)`, or `None` when the
/// denominator is zero.
pub fn compression_ratio(original_bits: u64, stream_bits: u64, codebook_bits: u64) -> Option<f64> {
    let compressed = stream_bits + codebook_bits;
    (compressed > 0).then(|| original_bits as f64 / compressed as f64)
}

/// Sample widths used for storage accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportParams {
    /// Bits per pixel of the uncompressed image.
    pub bits_per_pixel: u32,
    /// Bits charged per stored centroid component.
    pub bits_per_sample: u32,
}

impl Default for ReportParams {
    fn default() -> Self {
        Self {
            bits_per_pixel: 8,
            bits_per_sample: 8,
        }
    }
}

/// Storage summary for one compressed image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionReport {
    pub width: usize,
    pub height: usize,
    pub block_size: usize,
    pub block_count: usize,
    pub index_bits: u32,
    /// Entries actually trained (a power of two).
    pub codebook_entries: usize,
    /// Entries addressable by the index width (`2^index_bits`).
    pub codebook_capacity: u64,
    pub image_bytes: u64,
    pub stream_bits: u64,
    pub stream_bytes: u64,
    pub codebook_bits: u64,
    pub compression_ratio: Option<f64>,
}

impl CompressionReport {
    pub fn new(
        width: usize,
        height: usize,
        block_size: usize,
        codebook: &Codebook,
        stream: &CodedStream,
        params: &ReportParams,
    ) -> Self {
        let image_bits = image_size_bits(width, height, params.bits_per_pixel);
        let stream_bits = stream.size_in_bits(codebook.index_bits());
        let codebook_bits =
            codebook_storage_bits(codebook.len(), block_size, params.bits_per_sample);

        Self {
            width,
            height,
            block_size,
            block_count: stream.len(),
            index_bits: codebook.index_bits(),
            codebook_entries: codebook.len(),
            codebook_capacity: codebook.capacity(),
            image_bytes: image_bits / 8,
            stream_bits,
            stream_bytes: stream_bits.div_ceil(8),
            codebook_bits,
            compression_ratio: compression_ratio(image_bits, stream_bits, codebook_bits),
        }
    }
}

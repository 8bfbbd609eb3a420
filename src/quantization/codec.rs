//! Encoding blocks to codebook indices and decoding them back.

use crate::distance;
use crate::error::{Result, VqError};
use crate::grid::Grid;
use crate::partition::{self, Block};
use crate::quantization::codebook::Codebook;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Ordered index strings, one per block in partition order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodedStream {
    indices: Vec<String>,
}

impl CodedStream {
    pub fn new(indices: Vec<String>) -> Self {
        Self { indices }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[String] {
        &self.indices
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.indices.iter()
    }

    pub fn into_indices(self) -> Vec<String> {
        self.indices
    }

    /// Total payload in bits: every index is `index_bits` wide.
    pub fn size_in_bits(&self, index_bits: u32) -> u64 {
        self.indices.len() as u64 * u64::from(index_bits)
    }
}

impl From<Vec<String>> for CodedStream {
    fn from(indices: Vec<String>) -> Self {
        Self::new(indices)
    }
}

impl FromIterator<String> for CodedStream {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a CodedStream {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.indices.iter()
    }
}

/// Index of the centroid nearest to `block`.
///
/// Scans the whole codebook; ties go to the lowest index. An empty codebook
/// yields the empty string.
pub fn encode_block(block: &[u8], codebook: &Codebook) -> String {
    distance::nearest(block, codebook.centroids())
        .map(|(position, _)| codebook.index_of(position))
        .unwrap_or_default()
}

/// Encode every block, preserving order.
pub fn encode(blocks: &[Block], codebook: &Codebook) -> CodedStream {
    #[cfg(feature = "parallel")]
    let indices: Vec<String> = blocks
        .par_iter()
        .map(|b| encode_block(b, codebook))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let indices: Vec<String> = blocks.iter().map(|b| encode_block(b, codebook)).collect();

    CodedStream::new(indices)
}

/// Counters gathered while decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Indices found in the codebook.
    pub decoded: usize,
    /// Indices absent from the codebook, replaced by zero blocks.
    pub missing: usize,
}

/// Rounded centroid for `index`, or `None` if the codebook has no such entry.
pub fn decode_block(index: &str, codebook: &Codebook) -> Option<Vec<i32>> {
    codebook
        .get(index)
        .map(|centroid| centroid.iter().map(|&c| c.round() as i32).collect())
}

/// Decode a stream into reconstructed block vectors of `block_len` samples.
///
/// Unknown indices become all-zero blocks; the count is reported in
/// [`DecodeStats::missing`].
pub fn decode(
    stream: &CodedStream,
    codebook: &Codebook,
    block_len: usize,
) -> (Vec<Vec<i32>>, DecodeStats) {
    let mut stats = DecodeStats::default();
    let blocks = stream
        .iter()
        .map(|index| match decode_block(index, codebook) {
            Some(block) => {
                stats.decoded += 1;
                block
            }
            None => {
                stats.missing += 1;
                vec![0; block_len]
            }
        })
        .collect();

    if stats.missing > 0 {
        tracing::warn!(
            missing = stats.missing,
            total = stream.len(),
            "coded indices missing from codebook; substituted zero blocks"
        );
    }

    (blocks, stats)
}

/// Decode `stream` and reassemble a `width x height` grid.
///
/// Tile slots beyond the end of the stream, and the right/bottom remainder
/// that never held a full tile, stay zero.
pub fn reconstruct(
    stream: &CodedStream,
    codebook: &Codebook,
    width: usize,
    height: usize,
    block_size: usize,
) -> Result<(Grid, DecodeStats)> {
    if block_size == 0 {
        return Err(VqError::InvalidParameter(
            "block size must be greater than 0".to_string(),
        ));
    }
    let block_len = block_size.checked_mul(block_size).ok_or_else(|| {
        VqError::InvalidParameter(format!("block size {block_size} is too large"))
    })?;
    if !codebook.is_empty() && codebook.dimension() != block_len {
        return Err(VqError::DimensionMismatch {
            expected: format!("{block_len} components ({block_size}x{block_size} blocks)"),
            actual: format!("codebook of {} components", codebook.dimension()),
        });
    }

    let (blocks, stats) = decode(stream, codebook, block_len);
    let slots = partition::block_count(width, height, block_size);
    if blocks.len() != slots {
        tracing::debug!(
            blocks = blocks.len(),
            slots,
            "coded stream length differs from tile count"
        );
    }
    Ok((partition::assemble(&blocks, width, height, block_size), stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_entry_codebook() -> Codebook {
        Codebook::new(1, vec![vec![10.4, 20.6], vec![200.0, 250.5]]).unwrap()
    }

    #[test]
    fn encode_picks_nearest_entry() {
        let cb = two_entry_codebook();
        assert_eq!(encode_block(&[12, 18], &cb), "0");
        assert_eq!(encode_block(&[190, 255], &cb), "1");
    }

    #[test]
    fn encode_tie_goes_to_lowest_index() {
        let cb = Codebook::new(2, vec![vec![0.0], vec![10.0], vec![10.0]]).unwrap();
        assert_eq!(encode_block(&[10], &cb), "01");
        assert_eq!(encode_block(&[5], &cb), "00");
    }

    #[test]
    fn encode_with_empty_codebook_is_empty_string() {
        let stream = encode(&[vec![1, 2]], &Codebook::empty(1));
        assert_eq!(stream.indices(), &[String::new()]);
    }

    #[test]
    fn decode_rounds_centroids() {
        let cb = two_entry_codebook();
        assert_eq!(decode_block("0", &cb), Some(vec![10, 21]));
        assert_eq!(decode_block("1", &cb), Some(vec![200, 251]));
    }

    #[test]
    fn decode_substitutes_zero_block_for_unknown_index() {
        let cb = two_entry_codebook();
        let stream = CodedStream::from(vec!["1".to_string(), "11".to_string(), "x".to_string()]);
        let (blocks, stats) = decode(&stream, &cb, 2);
        assert_eq!(blocks, vec![vec![200, 251], vec![0, 0], vec![0, 0]]);
        assert_eq!(stats, DecodeStats { decoded: 1, missing: 2 });
    }

    #[test]
    fn reconstruct_clamps_out_of_range_components() {
        let cb = Codebook::new(0, vec![vec![-3.2, 300.0, 127.5, 0.4]]).unwrap();
        let stream = CodedStream::from(vec![String::new(); 2]);
        let (grid, stats) = reconstruct(&stream, &cb, 4, 2, 2).unwrap();
        assert_eq!(stats.missing, 0);
        assert_eq!(grid.samples(), &[0, 255, 0, 255, 128, 0, 128, 0]);
    }

    #[test]
    fn reconstruct_rejects_mismatched_block_size() {
        let cb = two_entry_codebook();
        let stream = CodedStream::from(vec!["0".to_string()]);
        assert!(matches!(
            reconstruct(&stream, &cb, 4, 4, 2),
            Err(VqError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn reconstruct_rejects_overflowing_block_size() {
        let cb = two_entry_codebook();
        assert!(matches!(
            reconstruct(&CodedStream::default(), &cb, 4, 4, 1usize << 33),
            Err(VqError::InvalidParameter(_))
        ));
        assert!(matches!(
            reconstruct(&CodedStream::default(), &Codebook::empty(1), 4, 4, usize::MAX),
            Err(VqError::InvalidParameter(_))
        ));
    }

    #[test]
    fn stream_size_counts_index_bits() {
        let stream: CodedStream = ["01", "10", "11"].iter().map(|s| s.to_string()).collect();
        assert_eq!(stream.size_in_bits(2), 6);
    }
}

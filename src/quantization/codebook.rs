//! Trained codebooks and their fixed-length binary indices.

use crate::error::{Result, VqError};

/// Number of index bits for a requested codebook size: `ceil(log2(n))`.
///
/// `n = 1` needs zero bits (every block maps to the empty index). `n = 0`
/// also reports zero; callers reject it before training.
#[inline]
#[must_use]
pub fn index_bits_for(n: usize) -> u32 {
    if n <= 1 {
        return 0;
    }
    usize::BITS - (n - 1).leading_zeros()
}

/// Render `position` as a binary string zero-padded to `bits` characters.
#[inline]
#[must_use]
pub fn format_index(position: usize, bits: u32) -> String {
    if bits == 0 {
        return String::new();
    }
    format!("{position:0width$b}", width = bits as usize)
}

/// Parse an index string of exactly `bits` binary digits.
///
/// Returns `None` for the wrong length or any character other than `0`/`1`.
#[must_use]
pub fn parse_index(index: &str, bits: u32) -> Option<usize> {
    if index.len() != bits as usize || bits as usize > usize::BITS as usize {
        return None;
    }
    index.bytes().try_fold(0usize, |acc, b| match b {
        b'0' => Some(acc << 1),
        b'1' => Some((acc << 1) | 1),
        _ => None,
    })
}

/// An ordered set of centroid vectors, each addressed by a fixed-width
/// binary index.
///
/// Entry `i` has index `format_index(i, index_bits)`. Order is significant:
/// the encoder breaks distance ties toward the lowest index.
#[derive(Debug, Clone, PartialEq)]
pub struct Codebook {
    index_bits: u32,
    dimension: usize,
    centroids: Vec<Vec<f64>>,
}

impl Codebook {
    /// Build a codebook from centroids in index order.
    ///
    /// All centroids must share one dimension and their count must fit in
    /// `index_bits` bits.
    pub fn new(index_bits: u32, centroids: Vec<Vec<f64>>) -> Result<Self> {
        let dimension = centroids.first().map_or(0, Vec::len);
        if let Some(bad) = centroids.iter().find(|c| c.len() != dimension) {
            return Err(VqError::DimensionMismatch {
                expected: format!("centroid of {dimension} components"),
                actual: format!("centroid of {} components", bad.len()),
            });
        }
        let fits = index_bits >= usize::BITS || centroids.len() <= (1usize << index_bits);
        if !fits {
            return Err(VqError::InvalidParameter(format!(
                "{} centroids do not fit in {index_bits}-bit indices",
                centroids.len()
            )));
        }
        Ok(Self {
            index_bits,
            dimension,
            centroids,
        })
    }

    /// A codebook with no entries.
    pub fn empty(index_bits: u32) -> Self {
        Self {
            index_bits,
            dimension: 0,
            centroids: Vec::new(),
        }
    }

    /// Width of every index string.
    #[inline]
    pub fn index_bits(&self) -> u32 {
        self.index_bits
    }

    /// Components per centroid (`block_size²`), or 0 when empty.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.centroids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }

    /// Number of distinct indices the index width can address (`2^L`).
    pub fn capacity(&self) -> u64 {
        1u64.checked_shl(self.index_bits).unwrap_or(u64::MAX)
    }

    /// Centroids in index order.
    pub fn centroids(&self) -> &[Vec<f64>] {
        &self.centroids
    }

    /// Index string of the entry at `position`.
    pub fn index_of(&self, position: usize) -> String {
        format_index(position, self.index_bits)
    }

    /// Position addressed by `index`, if it names an entry of this codebook.
    pub fn position_of(&self, index: &str) -> Option<usize> {
        parse_index(index, self.index_bits).filter(|&p| p < self.centroids.len())
    }

    /// Centroid addressed by `index`.
    pub fn get(&self, index: &str) -> Option<&[f64]> {
        self.position_of(index).map(|p| self.centroids[p].as_slice())
    }

    /// `(index, centroid)` pairs in index order.
    pub fn entries(&self) -> impl Iterator<Item = (String, &[f64])> + '_ {
        self.centroids
            .iter()
            .enumerate()
            .map(|(i, c)| (self.index_of(i), c.as_slice()))
    }
}

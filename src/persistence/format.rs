//! On-disk layouts for codebooks and coded streams.
//!
//! # Codebook File
//!
//! A JSON document holding the full index -> centroid mapping:
//!
//! ```text
//! {
//!   "format": "lbgvq-codebook",
//!   "version": 1,
//!   "index_bits": 3,
//!   "dimension": 16,
//!   "entries": [
//!     { "index": "000", "centroid": [12.5, 13.0, ...] },
//!     ...
//!   ]
//! }
//! ```
//!
//! Centroids are written with round-trip float precision, so loading yields
//! a mapping identical to the one saved.
//!
//! # Stream File
//!
//! Plain text, one index string per line, in block order:
//!
//! ```text
//! 000
//! 101
//! 101
//! ```
//!
//! A codebook with a single entry has zero-bit indices, so its stream is a
//! sequence of empty lines (one per block).

use super::error::{PersistenceError, PersistenceResult};
use crate::quantization::codebook::{parse_index, Codebook};
use serde::{Deserialize, Serialize};

/// Format tag written into every codebook file.
pub const CODEBOOK_FORMAT: &str = "lbgvq-codebook";

/// Current codebook format version.
pub const FORMAT_VERSION: u32 = 1;

/// One `(index, centroid)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodebookEntry {
    pub index: String,
    pub centroid: Vec<f64>,
}

/// Serialized codebook document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodebookFile {
    pub format: String,
    pub version: u32,
    pub index_bits: u32,
    pub dimension: usize,
    pub entries: Vec<CodebookEntry>,
}

impl From<&Codebook> for CodebookFile {
    fn from(codebook: &Codebook) -> Self {
        Self {
            format: CODEBOOK_FORMAT.to_string(),
            version: FORMAT_VERSION,
            index_bits: codebook.index_bits(),
            dimension: codebook.dimension(),
            entries: codebook
                .entries()
                .map(|(index, centroid)| CodebookEntry {
                    index,
                    centroid: centroid.to_vec(),
                })
                .collect(),
        }
    }
}

impl CodebookFile {
    /// Rebuild the codebook, checking that the document is self-consistent.
    ///
    /// Entries may appear in any order but must cover positions
    /// `0..entries.len()` exactly once with `index_bits`-wide indices.
    pub fn into_codebook(self) -> PersistenceResult<Codebook> {
        if self.format != CODEBOOK_FORMAT {
            return Err(PersistenceError::Format(format!(
                "expected format {CODEBOOK_FORMAT:?}, found {:?}",
                self.format
            )));
        }
        if self.version != FORMAT_VERSION {
            return Err(PersistenceError::Format(format!(
                "unsupported codebook version {} (expected {FORMAT_VERSION})",
                self.version
            )));
        }

        let n = self.entries.len();
        let mut slots: Vec<Option<Vec<f64>>> = vec![None; n];
        for entry in self.entries {
            let position = parse_index(&entry.index, self.index_bits).ok_or_else(|| {
                PersistenceError::Format(format!(
                    "index {:?} is not a {}-bit binary string",
                    entry.index, self.index_bits
                ))
            })?;
            if entry.centroid.len() != self.dimension {
                return Err(PersistenceError::Format(format!(
                    "entry {:?} has {} components, expected {}",
                    entry.index,
                    entry.centroid.len(),
                    self.dimension
                )));
            }
            let slot = slots.get_mut(position).ok_or_else(|| {
                PersistenceError::Format(format!(
                    "index {:?} is outside the {n} stored entries",
                    entry.index
                ))
            })?;
            if slot.replace(entry.centroid).is_some() {
                return Err(PersistenceError::Format(format!(
                    "duplicate index {:?}",
                    entry.index
                )));
            }
        }

        // Every slot is filled: n entries, n distinct positions below n.
        let centroids: Vec<Vec<f64>> = slots.into_iter().flatten().collect();
        Codebook::new(self.index_bits, centroids)
            .map_err(|e| PersistenceError::Format(e.to_string()))
    }
}

/// Render a stream as newline-terminated index lines.
pub fn encode_stream_lines<'a, I>(indices: I) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    let mut out = String::new();
    for index in indices {
        out.push_str(index);
        out.push('\n');
    }
    out
}

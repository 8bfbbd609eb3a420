//! Error types for lbgvq.

use crate::persistence::PersistenceError;
use thiserror::Error;

/// Errors that can occur while partitioning, training, coding or measuring.
///
/// Empty inputs are not errors: partitioning a grid smaller than the block
/// yields no blocks, and training/encoding short-circuit to empty results.
/// A coded index missing from the codebook is recovered during decoding
/// (see [`crate::quantization::codec::DecodeStats`]).
#[derive(Debug, Error)]
pub enum VqError {
    /// Invalid parameter value (block size, codebook size, dimensions).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Two grids (or a grid and its sample buffer) disagree in shape.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// Codebook or coded-stream storage failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type Result<T> = std::result::Result<T, VqError>;

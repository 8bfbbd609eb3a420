//! Error types for persistence operations.

use thiserror::Error;

/// Errors that can occur while storing or loading codebooks and streams.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// I/O error (file operations, disk I/O)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Format error (wrong format tag, version mismatch, inconsistent entries)
    #[error("format error: {0}")]
    Format(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Resource not found
    #[error("resource not found: {0}")]
    NotFound(String),
}

/// Result type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

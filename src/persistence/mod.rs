//! Disk persistence for codebooks and coded streams.
//!
//! A coded stream is meaningless without the codebook it was encoded
//! against: the indices carry no centroid information. Both are therefore
//! stored side by side, keyed by file path:
//!
//! - codebook: versioned JSON mapping binary index -> centroid
//!   (see [`format`])
//! - stream: one index string per line, in block order
//!
//! The grid dimensions and block size are not recoverable from either file
//! and must be supplied again when decoding (see
//! [`crate::pipeline::DecodeParams`]).

pub mod error;
pub mod format;
pub mod store;

pub use error::{PersistenceError, PersistenceResult};
pub use store::{load_codebook, load_stream, save_codebook, save_stream};

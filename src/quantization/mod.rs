//! Vector quantization of image blocks.
//!
//! # The Idea
//!
//! A `b x b` block of 8-bit samples is a point in `b²`-dimensional space.
//! Natural images reuse a small number of block patterns, so a few hundred
//! representative points (the codebook) can stand in for thousands of
//! blocks. Each block is then stored as the index of its nearest entry:
//!
//! ```text
//! block (16 samples × 8 bits = 128 bits)
//!    ↓ nearest centroid
//! index "0110"  (log2(16) = 4 bits)
//! ```
//!
//! The codebook itself must be stored next to the indices; it costs
//! `entries × b² × 8` bits regardless of image size.
//!
//! # Pieces
//!
//! - [`lbg`]: trains a codebook from the image's own blocks (split + Lloyd).
//! - [`codebook`]: ordered centroids with fixed-width binary indices.
//! - [`codec`]: nearest-centroid encoding and centroid lookup decoding.
//!
//! ## Tie-breaking
//!
//! Both training assignment and encoding scan centroids in index order and
//! keep the first minimum, so equidistant blocks always go to the lowest
//! index. Outputs are reproducible given the training seed.
//!
//! ## References
//!
//! - Linde, Buzo, Gray (1980). "An Algorithm for Vector Quantizer Design."
//! - Gersho, Gray (1992). "Vector Quantization and Signal Compression."

pub mod codebook;
pub mod codec;
pub mod lbg;

pub use codebook::{format_index, index_bits_for, parse_index, Codebook};
pub use codec::{decode, decode_block, encode, encode_block, reconstruct, CodedStream, DecodeStats};
pub use lbg::{LbgParams, LbgTrainer, StopReason, TrainingReport};

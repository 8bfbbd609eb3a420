//! lbgvq: grayscale image compression by vector quantization.
//!
//! An image is cut into fixed-size square blocks, a codebook of
//! representative blocks is trained on the image itself with the
//! Linde-Buzo-Gray algorithm, and every block is replaced by the binary
//! index of its nearest codebook entry.
//!
//! - [`partition`]: blocks in, blocks out, in a fixed row-major tile order
//! - [`quantization`]: LBG training, codebooks, encoding and decoding
//! - [`metrics`]: MSE and storage/compression-ratio accounting
//! - [`persistence`]: codebook and coded-stream files
//! - [`pipeline`]: [`VqCompressor`], the end-to-end facade
//!
//! # Critical Nuances
//!
//! ## Codebook sizes are powers of two
//!
//! LBG grows the codebook by splitting every centroid in two, so asking for
//! `N` entries yields the next power of two `>= N`. Indices are
//! `ceil(log2(N))` bits wide, which is exactly enough to address all of them.
//!
//! ## The coded stream is positional
//!
//! Index `i` in a stream belongs to the `i`-th tile in row-major order.
//! Neither the stream nor the codebook records the image size or block size;
//! the decoder must be told all three.
//!
//! ## Training is randomized only on degenerate input
//!
//! Empty clusters are repaired by injecting a randomly chosen block. Pass a
//! seed ([`quantization::LbgParams::seed`]) or an explicit RNG to make
//! training reproducible.
//!
//! ```rust
//! use lbgvq::{CompressParams, DecodeParams, Grid, VqCompressor};
//!
//! let grid = Grid::from_fn(32, 32, |x, y| ((x ^ y) * 8) as u8);
//! let mut params = CompressParams::default();
//! params.codebook_size = 16;
//! params.lbg.seed = Some(7);
//!
//! let vq = VqCompressor::new(params)?;
//! let out = vq.compress(&grid)?;
//! assert_eq!(out.codebook.len(), 16);
//!
//! let params = DecodeParams::new(32, 32, 4);
//! let decoded = VqCompressor::decompress(&out.codebook, &out.stream, &params)?;
//! assert_eq!(decoded.grid.dimensions(), (32, 32));
//! # Ok::<(), lbgvq::VqError>(())
//! ```

pub mod distance;
pub mod error;
pub mod grid;
pub mod metrics;
pub mod partition;
pub mod persistence;
pub mod pipeline;
pub mod quantization;

// Re-exports
pub use error::{Result, VqError};
pub use grid::Grid;
pub use pipeline::{CompressParams, Compressed, DecodeParams, Decompressed, VqCompressor};
pub use quantization::{CodedStream, Codebook, LbgParams, LbgTrainer};

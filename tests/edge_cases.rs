//! Edge case tests for lbgvq.
//!
//! Tests unusual inputs and boundary conditions that could cause failures.

use lbgvq::partition::partition;
use lbgvq::quantization::{decode, encode, LbgTrainer, StopReason};
use lbgvq::{Codebook, CodedStream, DecodeParams, Grid, VqCompressor};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn textured(width: usize, height: usize) -> Grid {
    Grid::from_fn(width, height, |x, y| {
        let v = (x * 13 + y * 7 + (x * y) % 17) % 256;
        v as u8
    })
}

// =============================================================================
// Grid / block size boundaries
// =============================================================================

#[test]
fn grid_smaller_than_block_gives_empty_everything() {
    let grid = Grid::filled(3, 10, 200);
    let blocks = partition(&grid, 4).unwrap();
    assert!(blocks.is_empty());

    let cb = LbgTrainer::new(4).unwrap().with_seed(0).fit(&blocks).unwrap();
    assert!(cb.is_empty());

    let stream = encode(&blocks, &cb);
    assert!(stream.is_empty());
}

#[test]
fn zero_sized_grid_partitions_to_nothing() {
    let grid = Grid::new(0, 0);
    assert!(partition(&grid, 2).unwrap().is_empty());
}

#[test]
fn block_size_one_is_scalar_quantization() {
    let grid = textured(6, 5);
    let blocks = partition(&grid, 1).unwrap();
    assert_eq!(blocks.len(), 30);
    assert!(blocks.iter().all(|b| b.len() == 1));
}

#[test]
fn block_equal_to_grid_gives_one_block() {
    let grid = textured(8, 8);
    let blocks = partition(&grid, 8).unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].as_slice(), grid.samples());
}

// =============================================================================
// Codebook size boundaries
// =============================================================================

#[test]
fn codebook_size_one_uses_zero_bit_indices() {
    let grid = textured(16, 16);
    let vq = VqCompressor::new(lbgvq::CompressParams {
        block_size: 4,
        codebook_size: 1,
        ..Default::default()
    })
    .unwrap();
    let out = vq.compress(&grid).unwrap();
    assert_eq!(out.codebook.len(), 1);
    assert_eq!(out.codebook.index_bits(), 0);
    assert!(out.stream.iter().all(String::is_empty));
    assert_eq!(out.report.stream_bits, 0);

    let dec = VqCompressor::decompress(&out.codebook, &out.stream, &DecodeParams::new(16, 16, 4))
        .unwrap();
    assert_eq!(dec.stats.missing, 0);
}

#[test]
fn non_power_of_two_request_rounds_up() {
    let grid = textured(32, 32);
    let blocks = partition(&grid, 4).unwrap();
    let cb = LbgTrainer::new(5).unwrap().with_seed(3).fit(&blocks).unwrap();
    assert_eq!(cb.len(), 8);
    assert_eq!(cb.index_bits(), 3);
    let keys: Vec<String> = cb.entries().map(|(k, _)| k).collect();
    assert_eq!(keys, ["000", "001", "010", "011", "100", "101", "110", "111"]);
}

#[test]
fn more_entries_than_blocks_still_fills_codebook() {
    // 4 blocks, 16 entries requested: most clusters need repair.
    let grid = textured(8, 8);
    let blocks = partition(&grid, 4).unwrap();
    let report = LbgTrainer::new(16)
        .unwrap()
        .train(&blocks, &mut StdRng::seed_from_u64(21))
        .unwrap();
    assert_eq!(report.codebook.len(), 16);
    assert!(report.repairs > 0);
    assert_eq!(report.stop, StopReason::Stalled);
    assert!(report.relaxation_passes < 100);
}

// =============================================================================
// Decoding edge cases
// =============================================================================

#[test]
fn foreign_indices_decode_to_zero_blocks() {
    let cb = Codebook::new(1, vec![vec![50.0; 4], vec![150.0; 4]]).unwrap();
    let stream = CodedStream::from(vec![
        "1".to_string(),
        "10".to_string(),
        String::new(),
        "0".to_string(),
    ]);
    let (blocks, stats) = decode(&stream, &cb, 4);
    assert_eq!(stats.decoded, 2);
    assert_eq!(stats.missing, 2);
    assert_eq!(blocks[1], vec![0; 4]);
    assert_eq!(blocks[2], vec![0; 4]);

    let dec = VqCompressor::decompress(&cb, &stream, &DecodeParams::new(4, 4, 2)).unwrap();
    assert_eq!(dec.grid.get(0, 0), 150);
    assert_eq!(dec.grid.get(2, 0), 0);
    assert_eq!(dec.grid.get(3, 3), 50);
}

#[test]
fn short_stream_leaves_remaining_tiles_zero() {
    let cb = Codebook::new(0, vec![vec![9.0; 4]]).unwrap();
    let stream = CodedStream::from(vec![String::new()]);
    let dec = VqCompressor::decompress(&cb, &stream, &DecodeParams::new(4, 2, 2)).unwrap();
    assert_eq!(dec.grid.samples(), &[9, 9, 0, 0, 9, 9, 0, 0]);
}

#[test]
fn remainder_strip_is_zero_after_reconstruction() {
    let grid = Grid::filled(10, 9, 77);
    let vq = VqCompressor::new(lbgvq::CompressParams {
        block_size: 4,
        codebook_size: 2,
        ..Default::default()
    })
    .unwrap();
    let out = vq.compress(&grid).unwrap();
    assert_eq!(out.stream.len(), 4);

    let dec = VqCompressor::decompress(&out.codebook, &out.stream, &DecodeParams::new(10, 9, 4))
        .unwrap();
    assert_eq!(dec.grid.get(7, 7), 77);
    assert_eq!(dec.grid.get(8, 0), 0);
    assert_eq!(dec.grid.get(0, 8), 0);
}

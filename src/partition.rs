//! Block partitioning and reassembly.
//!
//! A grid is cut into non-overlapping `b x b` tiles. Tile origins are visited
//! row-major (`y` outer, `x` inner) and each tile is flattened row-major
//! (`dy` outer, `dx` inner). Tiles that would cross the right or bottom edge
//! are dropped, so a `W x H` grid yields `(W / b) * (H / b)` blocks.
//!
//! The visiting order is the only link between a block's position in a coded
//! stream and its location in the image, so [`partition`] and [`assemble`]
//! share [`block_origins`].

use crate::error::{Result, VqError};
use crate::grid::Grid;

/// Flattened `b x b` tile of samples.
pub type Block = Vec<u8>;

/// Iterator over tile origins `(x, y)` in partition order.
///
/// Empty when `block_size` is zero or larger than either dimension.
pub fn block_origins(
    width: usize,
    height: usize,
    block_size: usize,
) -> impl Iterator<Item = (usize, usize)> {
    let (cols, rows) = if block_size == 0 {
        (0, 0)
    } else {
        (width / block_size, height / block_size)
    };
    (0..rows).flat_map(move |r| (0..cols).map(move |c| (c * block_size, r * block_size)))
}

/// Number of full tiles a `width x height` grid holds.
pub fn block_count(width: usize, height: usize, block_size: usize) -> usize {
    if block_size == 0 {
        return 0;
    }
    (width / block_size) * (height / block_size)
}

/// Cut `grid` into `block_size x block_size` block vectors.
///
/// Returns no blocks (not an error) when the tile does not fit the grid.
pub fn partition(grid: &Grid, block_size: usize) -> Result<Vec<Block>> {
    if block_size == 0 {
        return Err(VqError::InvalidParameter(
            "block size must be greater than 0".to_string(),
        ));
    }

    if block_size > grid.width().min(grid.height()) {
        tracing::debug!(
            width = grid.width(),
            height = grid.height(),
            block_size,
            "grid holds no full block"
        );
        return Ok(Vec::new());
    }

    // b <= min(W, H), so b * b <= W * H and cannot overflow.
    let dim = block_size * block_size;
    let mut blocks = Vec::with_capacity(block_count(grid.width(), grid.height(), block_size));

    for (x, y) in block_origins(grid.width(), grid.height(), block_size) {
        let mut block = Vec::with_capacity(dim);
        for dy in 0..block_size {
            let row = (y + dy) * grid.width();
            block.extend_from_slice(&grid.samples()[row + x..row + x + block_size]);
        }
        blocks.push(block);
    }

    Ok(blocks)
}

/// Write blocks back into a fresh zero-filled `width x height` grid.
///
/// Blocks are placed in partition order until either blocks or tile slots
/// run out. Samples are clamped to `[0, 255]`; a short block fills only its
/// leading samples and extra samples past `b * b` are ignored.
pub fn assemble<B, T>(blocks: &[B], width: usize, height: usize, block_size: usize) -> Grid
where
    B: AsRef<[T]>,
    T: Copy + Into<i32>,
{
    let mut grid = Grid::new(width, height);

    for ((x, y), block) in block_origins(width, height, block_size).zip(blocks) {
        let block = block.as_ref();
        for (i, &v) in block.iter().take(block_size * block_size).enumerate() {
            let (dy, dx) = (i / block_size, i % block_size);
            grid.set(x + dx, y + dy, Into::<i32>::into(v).clamp(0, 255) as u8);
        }
    }

    grid
}

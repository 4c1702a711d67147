//! Fixed-size serializer for 7×7 integer grids.
//!
//! A grid is written row-major, one signed byte per cell, so every grid
//! occupies exactly [`GRID_SIZE`] bytes no matter its contents.

use super::ByteReader;
use crate::errors::Result;

/// Rows in a PIN grid.
pub const ROW_COUNT: usize = 7;

/// Columns in a PIN grid.
pub const COLUMN_COUNT: usize = 7;

/// Encoded width of a single cell in bytes.
pub const CELL_WIDTH: usize = 1;

/// Encoded size of one grid.
pub const GRID_SIZE: usize = ROW_COUNT * COLUMN_COUNT * CELL_WIDTH;

/// A 7×7 grid of small signed integers.
pub type Grid = [[i8; COLUMN_COUNT]; ROW_COUNT];

/// Append the fixed-size encoding of `grid` to `buf`.
pub fn write_grid(buf: &mut Vec<u8>, grid: &Grid) {
    for row in grid {
        buf.extend(row.iter().map(|cell| cell.to_be_bytes()[0]));
    }
}

/// Read one grid block from `reader`.
pub fn read_grid(reader: &mut ByteReader<'_>) -> Result<Grid> {
    let block = reader.read_exact(GRID_SIZE)?;
    let mut grid = [[0i8; COLUMN_COUNT]; ROW_COUNT];
    for (row, chunk) in grid.iter_mut().zip(block.chunks_exact(COLUMN_COUNT * CELL_WIDTH)) {
        for (cell, byte) in row.iter_mut().zip(chunk) {
            *cell = i8::from_be_bytes([*byte]);
        }
    }
    Ok(grid)
}

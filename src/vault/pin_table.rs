//! The 7×7 PIN table: a digit grid plus a parallel colour-pattern grid.
//!
//! Digits are `-1` (empty) or `0..=9`.  Pattern indices are `0..=9`,
//! where `0..=4` are the standard palette and `5..=9` the same colours
//! in the alternate (accessible) palette.
//!
//! Binary layout (version 0):
//!
//! ```text
//! [version: 1 byte][digits: 49 bytes][pattern: 49 bytes]
//! ```

use rand::Rng;

use crate::codec::grid::{self, Grid, COLUMN_COUNT, GRID_SIZE, ROW_COUNT};
use crate::codec::{self, ByteReader, Serializable};
use crate::errors::{PinVaultError, Result};

/// Sentinel for an empty digit cell.
pub const EMPTY_DIGIT: i8 = -1;

/// Number of colours in one palette.
pub const PALETTE_SIZE: u8 = 5;

/// Encoded size of a PIN table: version byte + two grids.
///
/// Backup structures rely on this to find where the PIN table ends.
pub const PIN_TABLE_SIZE: usize = 1 + 2 * GRID_SIZE;

/// Map a standard palette index to its alternate-palette counterpart.
pub fn alternate_palette_index(index: u8) -> Result<u8> {
    if index >= PALETTE_SIZE {
        return Err(PinVaultError::InvalidPinTable(format!(
            "palette index {index} is not a standard colour (0-4)"
        )));
    }
    Ok(index + PALETTE_SIZE)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinTable {
    digits: Grid,
    pattern: Grid,
}

impl Default for PinTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PinTable {
    /// An empty table: every digit `-1`, every pattern cell colour `0`.
    pub fn new() -> Self {
        Self {
            digits: [[EMPTY_DIGIT; COLUMN_COUNT]; ROW_COUNT],
            pattern: [[0; COLUMN_COUNT]; ROW_COUNT],
        }
    }

    /// Build a table from complete grids, validating every cell.
    pub fn from_grids(digits: Grid, pattern: Grid) -> Result<Self> {
        let table = Self { digits, pattern };
        table.validate()?;
        Ok(table)
    }

    pub fn put(&mut self, row: usize, column: usize, digit: i8) -> Result<()> {
        check_coordinates(row, column)?;
        check_digit(digit)?;
        self.digits[row][column] = digit;
        Ok(())
    }

    pub fn put_pattern(&mut self, row: usize, column: usize, index: u8) -> Result<()> {
        check_coordinates(row, column)?;
        check_pattern(index as i8)?;
        self.pattern[row][column] = index as i8;
        Ok(())
    }

    /// Digit at `(row, column)`, `-1` if empty.
    pub fn get(&self, row: usize, column: usize) -> Result<i8> {
        check_coordinates(row, column)?;
        Ok(self.digits[row][column])
    }

    /// Pattern index at `(row, column)`.
    pub fn pattern(&self, row: usize, column: usize) -> Result<u8> {
        check_coordinates(row, column)?;
        Ok(self.pattern[row][column] as u8)
    }

    pub fn digits(&self) -> &Grid {
        &self.digits
    }

    pub fn pattern_grid(&self) -> &Grid {
        &self.pattern
    }

    /// Clear every digit.  The pattern is kept.
    pub fn reset_digits(&mut self) {
        self.digits = [[EMPTY_DIGIT; COLUMN_COUNT]; ROW_COUNT];
    }

    /// `true` once no digit cell is empty.
    pub fn is_filled(&self) -> bool {
        self.digits.iter().flatten().all(|&d| d != EMPTY_DIGIT)
    }

    /// Fill every cell whose index (`row * 7 + column`) is not in
    /// `ignored` with a random digit.
    pub fn fill(&mut self, ignored: &[usize]) {
        let mut rng = rand::rng();
        for (row_index, row) in self.digits.iter_mut().enumerate() {
            for (column_index, cell) in row.iter_mut().enumerate() {
                if !ignored.contains(&(row_index * COLUMN_COUNT + column_index)) {
                    *cell = rng.random_range(0..10);
                }
            }
        }
    }

    fn validate(&self) -> Result<()> {
        for &digit in self.digits.iter().flatten() {
            check_digit(digit)?;
        }
        for &index in self.pattern.iter().flatten() {
            check_pattern(index)?;
        }
        Ok(())
    }
}

impl Serializable for PinTable {
    const NAME: &'static str = "PinTable";
    const VERSION: u8 = 0;

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(PIN_TABLE_SIZE);
        buf.push(Self::VERSION);
        grid::write_grid(&mut buf, &self.digits);
        grid::write_grid(&mut buf, &self.pattern);
        tracing::debug!(size = buf.len(), "encoded PinTable");
        Ok(buf)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        codec::read_version::<Self>(&mut reader)?;
        let digits = grid::read_grid(&mut reader)?;
        let pattern = grid::read_grid(&mut reader)?;
        reader.finish()?;

        let table = Self { digits, pattern };
        table
            .validate()
            .map_err(|e| PinVaultError::Decode(e.to_string()))?;
        Ok(table)
    }
}

fn check_coordinates(row: usize, column: usize) -> Result<()> {
    if row >= ROW_COUNT || column >= COLUMN_COUNT {
        return Err(PinVaultError::InvalidPinTable(format!(
            "cell ({row}, {column}) is outside the {ROW_COUNT}x{COLUMN_COUNT} grid"
        )));
    }
    Ok(())
}

fn check_digit(digit: i8) -> Result<()> {
    if !(EMPTY_DIGIT..=9).contains(&digit) {
        return Err(PinVaultError::InvalidPinTable(format!(
            "digit {digit} is outside -1..=9"
        )));
    }
    Ok(())
}

fn check_pattern(index: i8) -> Result<()> {
    if !(0..2 * PALETTE_SIZE as i8).contains(&index) {
        return Err(PinVaultError::InvalidPinTable(format!(
            "pattern index {index} is outside 0..=9"
        )));
    }
    Ok(())
}

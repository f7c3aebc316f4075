//! Seeds and rows.
//!
//! A seed is written either as an integer (`65536`, `0x10000`, `0b101`),
//! whose bit `i` becomes position `i`, or as an explicit row of `0`/`1`
//! characters read left to right (`row:00100`). Either form is zero-extended
//! to the lattice width; a live bit past the last position is an error.

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use crate::{CellState, RuleError};

/// Prefix selecting the explicit row notation when parsing a [`Seed`].
pub const ROW_PREFIX: &str = "row:";

/// Initial bit pattern, position 0 first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Seed {
    bits: Vec<CellState>,
}

impl Seed {
    /// Seed from an integer, least-significant bit at position 0.
    pub fn from_integer(value: u128) -> Self {
        let width = (u128::BITS - value.leading_zeros()) as usize;
        let bits = (0..width)
            .map(|i| CellState::from_bit((value >> i) as u8))
            .collect();
        Self { bits }
    }

    /// Seed from explicit states, position 0 first.
    pub fn from_cells(cells: impl IntoIterator<Item = CellState>) -> Self {
        Self {
            bits: cells.into_iter().collect(),
        }
    }

    /// A single live cell at `position`.
    pub fn single(position: usize) -> Self {
        let mut bits = vec![CellState::Dead; position + 1];
        bits[position] = CellState::Alive;
        Self { bits }
    }

    /// Highest live position, if any.
    pub fn highest_live(&self) -> Option<usize> {
        self.bits.iter().rposition(|s| s.is_alive())
    }

    /// Zero-extend the seed into a row of `width` cells.
    pub fn expand(&self, width: usize) -> Result<Row, RuleError> {
        if let Some(bit) = self.highest_live().filter(|&bit| bit >= width) {
            return Err(RuleError::SeedOverflow { bit, width });
        }
        let mut cells = vec![CellState::Dead; width];
        for (cell, bit) in cells.iter_mut().zip(&self.bits) {
            *cell = *bit;
        }
        Ok(Row::new(cells))
    }
}

impl From<Row> for Seed {
    fn from(row: Row) -> Self {
        Self {
            bits: row.into_cells(),
        }
    }
}

impl FromStr for Seed {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let invalid = |reason: String| RuleError::InvalidSeed {
            input: s.to_string(),
            reason,
        };

        if let Some(row) = input.strip_prefix(ROW_PREFIX) {
            return row.parse::<Row>().map(Self::from);
        }

        let digits = input.replace('_', "");
        let parsed = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
            u128::from_str_radix(hex, 16)
        } else if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
            u128::from_str_radix(bin, 2)
        } else {
            digits.parse::<u128>()
        };

        parsed
            .map(Self::from_integer)
            .map_err(|e| invalid(e.to_string()))
    }
}

/// One generation of the lattice, left to right by position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Row {
    cells: Vec<CellState>,
}

impl Row {
    pub fn new(cells: Vec<CellState>) -> Self {
        Self { cells }
    }

    /// An all-dead row.
    pub fn dead(width: usize) -> Self {
        Self::new(vec![CellState::Dead; width])
    }

    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<CellState> {
        self.cells
    }

    /// Raw bits, position 0 first.
    pub fn bits(&self) -> Vec<u8> {
        self.cells.iter().map(|s| s.bit()).collect()
    }

    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|s| s.is_alive()).count()
    }
}

impl Deref for Row {
    type Target = [CellState];

    fn deref(&self) -> &Self::Target {
        &self.cells
    }
}

impl FromIterator<CellState> for Row {
    fn from_iter<T: IntoIterator<Item = CellState>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl FromStr for Row {
    type Err = RuleError;

    /// Parse `0`/`1` characters left to right; spaces and `_` are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .map(|c| match c {
                '0' => Ok(CellState::Dead),
                '1' => Ok(CellState::Alive),
                other => Err(RuleError::InvalidSeed {
                    input: s.to_string(),
                    reason: format!("unexpected character {other:?}"),
                }),
            })
            .collect()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, state) in self.cells.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{state}")?;
        }
        Ok(())
    }
}

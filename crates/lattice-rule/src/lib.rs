//! Lattice Rules
//!
//! Elementary (one-dimensional, radius-1, binary) cellular automaton rules.
//!
//! # Neighborhood Codes
//!
//! A cell's next state depends on three bits: its left neighbor, itself and
//! its right neighbor. Concatenated MSB-first they form a code in `0..8`:
//!
//! ```text
//! code = left << 2 | center << 1 | right
//! ```
//!
//! # Rule Numbers
//!
//! Wolfram's numbering packs the eight outcomes into one byte: bit `i` of the
//! rule number is the next state for neighborhood code `i`. Rule 30 is
//! `0b0001_1110`, so codes 1 through 4 produce a live cell.
//!
//! # Seeds
//!
//! A [`Seed`] is the initial bit pattern, least-significant bit at position 0,
//! zero-extended to the lattice width.

mod error;
mod seed;
mod state;
mod table;

pub use error::RuleError;
pub use seed::{Row, Seed, ROW_PREFIX};
pub use state::{CellState, NeighborhoodCode};
pub use table::RuleTable;

/// Number of distinct radius-1 neighborhoods.
pub const NEIGHBORHOODS: usize = 8;

/// Largest valid rule number.
pub const MAX_RULE: u32 = 255;

// One rule bit per neighborhood: the rule number fits in a byte.
const _: () = assert!(NEIGHBORHOODS == u8::BITS as usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_30_regression_row() {
        let table = RuleTable::new(30);
        let row: Row = "00100".parse().unwrap();

        let next: Vec<u8> = (0..row.len())
            .map(|i| {
                let left = if i == 0 { CellState::Dead } else { row[i - 1] };
                let right = row.get(i + 1).copied().unwrap_or(CellState::Dead);
                table.next_state(NeighborhoodCode::from_cells(left, row[i], right)).bit()
            })
            .collect();

        assert_eq!(next, vec![0, 1, 1, 1, 0]);
    }
}

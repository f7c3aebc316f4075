//! Cell states and neighborhood codes.

use std::fmt;

use crate::{RuleError, NEIGHBORHOODS};

/// The value held by one lattice position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "u8", try_from = "u8"))]
#[repr(u8)]
pub enum CellState {
    #[default]
    Dead = 0,
    Alive = 1,
}

impl CellState {
    /// The state as a single bit.
    pub const fn bit(self) -> u8 {
        self as u8
    }

    /// Build a state from the low bit of `value`.
    pub const fn from_bit(value: u8) -> Self {
        if value & 1 == 1 {
            Self::Alive
        } else {
            Self::Dead
        }
    }

    pub const fn is_alive(self) -> bool {
        matches!(self, Self::Alive)
    }
}

impl From<bool> for CellState {
    fn from(alive: bool) -> Self {
        if alive {
            Self::Alive
        } else {
            Self::Dead
        }
    }
}

impl From<CellState> for u8 {
    fn from(state: CellState) -> Self {
        state.bit()
    }
}

impl TryFrom<u8> for CellState {
    type Error = RuleError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Dead),
            1 => Ok(Self::Alive),
            other => Err(RuleError::InvalidState(other)),
        }
    }
}

impl fmt::Display for CellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bit())
    }
}

/// Index into a [`RuleTable`](crate::RuleTable): left, center and right bits, MSB-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NeighborhoodCode(u8);

impl NeighborhoodCode {
    /// The all-dead neighborhood.
    pub const ZERO: Self = Self(0);

    /// Build a code from an explicit value. Only the low three bits are kept.
    pub const fn new(value: u8) -> Self {
        Self(value & (NEIGHBORHOODS as u8 - 1))
    }

    /// Concatenate three cells into a code.
    pub const fn from_cells(left: CellState, center: CellState, right: CellState) -> Self {
        Self::ZERO.push(left).push(center).push(right)
    }

    /// Shift one bit in from the right.
    ///
    /// Pushing exactly three bits, left to right, yields the full code.
    #[must_use]
    pub const fn push(self, state: CellState) -> Self {
        Self::new((self.0 << 1) | state.bit())
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NeighborhoodCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03b}", self.0)
    }
}

//! Read windows: the three taps a position combines into a neighborhood code.
//!
//! Taps are stored in read order. Relay reads come first, left to right, and
//! constant zeros fill the remaining slots, so every missing neighbor costs
//! one extra left shift after the last read.

use lattice_rule::{CellState, NeighborhoodCode};

use crate::WINDOW_TAPS;

/// Bit of the neighborhood code a tap fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Slot {
    /// Bit 2, shifted in first.
    High,
    /// Bit 1.
    Middle,
    /// Bit 0, shifted in last.
    Low,
}

impl Slot {
    /// All slots in read order.
    pub const ALL: [Slot; WINDOW_TAPS] = [Slot::High, Slot::Middle, Slot::Low];
}

/// One input to a neighborhood code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tap {
    /// Read the relay owned by this position.
    Cell(usize),
    /// Missing neighbor; contributes a 0 bit without a read.
    Zero,
}

impl Tap {
    pub const fn position(self) -> Option<usize> {
        match self {
            Self::Cell(position) => Some(position),
            Self::Zero => None,
        }
    }
}

/// The taps of one position, in read order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Window {
    taps: [Tap; WINDOW_TAPS],
}

impl Window {
    pub const fn new(taps: [Tap; WINDOW_TAPS]) -> Self {
        Self { taps }
    }

    /// Window reading `sources` in order, padded with zeros at the end.
    ///
    /// Sources beyond [`WINDOW_TAPS`] are ignored.
    pub fn padded(sources: impl IntoIterator<Item = usize>) -> Self {
        let mut taps = [Tap::Zero; WINDOW_TAPS];
        for (tap, source) in taps.iter_mut().zip(sources) {
            *tap = Tap::Cell(source);
        }
        Self { taps }
    }

    pub fn taps(&self) -> &[Tap; WINDOW_TAPS] {
        &self.taps
    }

    pub fn tap(&self, slot: Slot) -> Tap {
        self.taps[slot as usize]
    }

    /// Taps paired with the slot they fill, in read order.
    pub fn slots(&self) -> impl Iterator<Item = (Slot, Tap)> + '_ {
        Slot::ALL.into_iter().zip(self.taps.iter().copied())
    }

    /// Positions read this generation, in read order. Repeats are kept: on a
    /// small ring the same relay may feed more than one tap.
    pub fn reads(&self) -> impl Iterator<Item = usize> + '_ {
        self.taps.iter().filter_map(|tap| tap.position())
    }

    /// Number of relay reads per generation.
    pub fn read_count(&self) -> usize {
        self.reads().count()
    }

    /// True when at least one neighbor is missing.
    pub fn is_padded(&self) -> bool {
        self.taps.contains(&Tap::Zero)
    }

    /// Combine tap values into a code. `value_of` is only called for
    /// [`Tap::Cell`] taps, in read order.
    pub fn code<F>(&self, mut value_of: F) -> NeighborhoodCode
    where
        F: FnMut(usize) -> CellState,
    {
        self.taps.iter().fold(NeighborhoodCode::ZERO, |code, tap| {
            let bit = match *tap {
                Tap::Cell(position) => value_of(position),
                Tap::Zero => CellState::Dead,
            };
            code.push(bit)
        })
    }
}

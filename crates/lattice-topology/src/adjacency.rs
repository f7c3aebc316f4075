//! Lattice wiring table.
//!
//! The table answers two questions for every position `p`:
//!
//! - which relays does `p` read, and in which order? ([`Adjacency::window`])
//! - which read slots does the relay of `p` feed? ([`Adjacency::subscribers`])
//!
//! The second is derived from the first, so the relay fan-out always matches
//! the reads exactly.

use lattice_rule::{NeighborhoodCode, Row, RuleTable};

use crate::{BoundaryPolicy, Slot, Tap, TopologyError, Window, WINDOW_TAPS};

/// Neighbor offsets in read order: left, self, right.
const OFFSETS: [isize; WINDOW_TAPS] = [-1, 0, 1];

/// A read slot fed by a relay: `reader` reads the relay into code bit `slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Subscription {
    pub reader: usize,
    pub slot: Slot,
}

/// Windows and subscriber lists for a fixed-size lattice.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Adjacency {
    policy: BoundaryPolicy,
    windows: Vec<Window>,
    subscribers: Vec<Vec<Subscription>>,
}

impl Adjacency {
    /// Build the wiring for `size` positions.
    pub fn new(size: usize, policy: BoundaryPolicy) -> Result<Self, TopologyError> {
        if size == 0 {
            return Err(TopologyError::EmptyLattice);
        }

        // Existing neighbors are read first; a missing one becomes a trailing
        // zero, i.e. one extra shift after the last read.
        let windows: Vec<Window> = (0..size)
            .map(|position| {
                Window::padded(
                    OFFSETS
                        .iter()
                        .filter_map(|&offset| policy.resolve(position, offset, size)),
                )
            })
            .collect();

        let mut subscribers = vec![Vec::new(); size];
        for (reader, window) in windows.iter().enumerate() {
            for (slot, tap) in window.slots() {
                if let Tap::Cell(source) = tap {
                    subscribers[source].push(Subscription { reader, slot });
                }
            }
        }

        Ok(Self {
            policy,
            windows,
            subscribers,
        })
    }

    pub fn size(&self) -> usize {
        self.windows.len()
    }

    pub fn policy(&self) -> BoundaryPolicy {
        self.policy
    }

    pub fn window(&self, position: usize) -> &Window {
        &self.windows[position]
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    /// Read slots fed by the relay of `position`, ordered by reader then slot.
    pub fn subscribers(&self, position: usize) -> &[Subscription] {
        &self.subscribers[position]
    }

    /// Copies the relay of `position` must deliver each generation.
    pub fn reader_count(&self, position: usize) -> usize {
        self.subscribers[position].len()
    }

    /// True if `position` is missing a true neighbor on either side.
    pub fn is_boundary(&self, position: usize) -> bool {
        self.windows[position].is_padded()
    }

    /// Total relay reads per generation across the lattice.
    pub fn total_reads(&self) -> usize {
        self.windows.iter().map(Window::read_count).sum()
    }

    /// Neighborhood code of `position` in `row`.
    pub fn neighborhood(&self, position: usize, row: &Row) -> NeighborhoodCode {
        self.windows[position].code(|source| row[source])
    }

    /// Advance `row` one generation sequentially.
    ///
    /// This is the reference evolution the concurrent runtime must reproduce.
    pub fn step(&self, rule: &RuleTable, row: &Row) -> Result<Row, TopologyError> {
        self.check_width(row)?;
        Ok((0..self.size())
            .map(|position| rule.next_state(self.neighborhood(position, row)))
            .collect())
    }

    /// Rows for generations 1 through `generations`, seed excluded.
    pub fn evolve(
        &self,
        rule: &RuleTable,
        seed: &Row,
        generations: usize,
    ) -> Result<Vec<Row>, TopologyError> {
        self.check_width(seed)?;
        let mut rows = Vec::with_capacity(generations);
        let mut current = seed.clone();
        for _ in 0..generations {
            current = self.step(rule, &current)?;
            rows.push(current.clone());
        }
        Ok(rows)
    }

    fn check_width(&self, row: &Row) -> Result<(), TopologyError> {
        if row.len() != self.size() {
            return Err(TopologyError::WidthMismatch {
                expected: self.size(),
                actual: row.len(),
            });
        }
        Ok(())
    }
}

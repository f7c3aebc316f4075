//! The eight-entry rule lookup table.
//!
//! Built once from a rule number and never mutated afterwards, so a single
//! table can be shared by every cell without synchronization.

use std::fmt;

use crate::{CellState, NeighborhoodCode, RuleError, MAX_RULE, NEIGHBORHOODS};

/// Next-state lookup indexed by [`NeighborhoodCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleTable {
    outcomes: [CellState; NEIGHBORHOODS],
}

impl RuleTable {
    /// Build the table for a rule number: entry `i` is bit `i` of `rule`.
    ///
    /// # Examples
    ///
    /// ```
    /// use lattice_rule::RuleTable;
    ///
    /// let table = RuleTable::new(30);
    /// assert_eq!(table.bits(), [0, 1, 1, 1, 1, 0, 0, 0]);
    /// ```
    pub const fn new(rule: u8) -> Self {
        let mut outcomes = [CellState::Dead; NEIGHBORHOODS];
        let mut i = 0;
        while i < NEIGHBORHOODS {
            outcomes[i] = CellState::from_bit(rule >> i);
            i += 1;
        }
        Self { outcomes }
    }

    /// Build a table from an untrusted rule number, rejecting anything above 255.
    pub fn from_number(rule: u32) -> Result<Self, RuleError> {
        u8::try_from(rule)
            .map(Self::new)
            .map_err(|_| RuleError::RuleOutOfRange(rule))
    }

    /// Build a table directly from its eight outcomes.
    pub const fn from_outcomes(outcomes: [CellState; NEIGHBORHOODS]) -> Self {
        Self { outcomes }
    }

    /// Reconstruct the rule number by summing `bit_i * 2^i`.
    pub fn rule_number(&self) -> u8 {
        self.outcomes
            .iter()
            .enumerate()
            .fold(0u8, |rule, (i, state)| rule | (state.bit() << i))
    }

    /// Next state for a neighborhood.
    pub const fn next_state(&self, code: NeighborhoodCode) -> CellState {
        self.outcomes[code.index()]
    }

    pub fn outcomes(&self) -> &[CellState; NEIGHBORHOODS] {
        &self.outcomes
    }

    /// Outcomes as raw bits, index 0 first.
    pub fn bits(&self) -> [u8; NEIGHBORHOODS] {
        self.outcomes.map(CellState::bit)
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::new(30)
    }
}

impl TryFrom<u32> for RuleTable {
    type Error = RuleError;

    fn try_from(rule: u32) -> Result<Self, Self::Error> {
        Self::from_number(rule)
    }
}

impl fmt::Display for RuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule {} [", self.rule_number())?;
        for (i, state) in self.outcomes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{state}")?;
        }
        f.write_str("]")
    }
}

// Guard the const constructor against a silent change in bit order.
const _: () = assert!(RuleTable::new(1).outcomes[0] as u8 == 1);
const _: () = assert!(MAX_RULE == u8::MAX as u32);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rule_30_table() {
        assert_eq!(RuleTable::new(30).bits(), [0, 1, 1, 1, 1, 0, 0, 0]);
    }

    #[test]
    fn rule_110_table() {
        assert_eq!(RuleTable::new(110).bits(), [0, 1, 1, 1, 0, 1, 1, 0]);
    }

    #[test]
    fn extreme_rules() {
        assert!(RuleTable::new(0).outcomes().iter().all(|s| !s.is_alive()));
        assert!(RuleTable::new(255).outcomes().iter().all(|s| s.is_alive()));
    }

    #[test]
    fn every_rule_round_trips() {
        for rule in 0..=u8::MAX {
            assert_eq!(RuleTable::new(rule).rule_number(), rule, "rule {}", rule);
        }
    }

    #[test]
    fn out_of_range_rule_fails_fast() {
        assert_eq!(RuleTable::from_number(256), Err(RuleError::RuleOutOfRange(256)));
        assert_eq!(RuleTable::try_from(90u32), Ok(RuleTable::new(90)));
    }

    #[test]
    fn lookup_by_code() {
        let table = RuleTable::new(30);
        assert_eq!(table.next_state(NeighborhoodCode::new(0b001)), CellState::Alive);
        assert_eq!(table.next_state(NeighborhoodCode::new(0b111)), CellState::Dead);
    }

    #[test]
    fn display_lists_bits() {
        assert_eq!(RuleTable::new(30).to_string(), "rule 30 [0 1 1 1 1 0 0 0]");
    }

    proptest! {
        #[test]
        fn outcomes_rebuild_the_same_table(rule in any::<u8>()) {
            let table = RuleTable::new(rule);
            prop_assert_eq!(RuleTable::from_outcomes(*table.outcomes()), table);
        }

        #[test]
        fn entry_matches_rule_bit(rule in any::<u8>(), code in 0u8..8) {
            let expected = (rule >> code) & 1;
            prop_assert_eq!(RuleTable::new(rule).next_state(NeighborhoodCode::new(code)).bit(), expected);
        }
    }
}

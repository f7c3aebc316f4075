//! Error types for lattice-rule.

use thiserror::Error;

/// Errors raised while building rules, states and seeds from raw input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// Rule numbers are a single byte.
    #[error("rule {0} is out of range (expected 0..=255)")]
    RuleOutOfRange(u32),

    /// A cell value other than 0 or 1.
    #[error("invalid cell state {0} (expected 0 or 1)")]
    InvalidState(u8),

    /// The seed does not parse as an integer or a row of bits.
    #[error("invalid seed {input:?}: {reason}")]
    InvalidSeed { input: String, reason: String },

    /// The seed sets a bit that has no position on the lattice.
    #[error("seed sets bit {bit} but the lattice only has {width} positions")]
    SeedOverflow { bit: usize, width: usize },
}

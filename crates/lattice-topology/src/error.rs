//! Error types for lattice-topology.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// A lattice needs at least one position.
    #[error("lattice size must be at least 1")]
    EmptyLattice,

    /// A row whose width does not match the lattice.
    #[error("row has {actual} cells but the lattice has {expected} positions")]
    WidthMismatch { expected: usize, actual: usize },

    /// Unknown boundary policy name.
    #[error("unknown boundary policy {0:?} (expected \"zero\" or \"ring\")")]
    UnknownBoundary(String),
}

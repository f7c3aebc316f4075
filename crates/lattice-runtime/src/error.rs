//! Error types for lattice-runtime.

use std::fmt;
use std::time::Duration;

use lattice_rule::RuleError;
use lattice_topology::TopologyError;
use thiserror::Error;

/// Result type for lattice-runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Identifies one of the concurrent participants of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorId {
    Cell(usize),
    Relay(usize),
    Scheduler,
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cell(position) => write!(f, "cell {position}"),
            Self::Relay(position) => write!(f, "relay {position}"),
            Self::Scheduler => f.write_str("scheduler"),
        }
    }
}

/// Errors that can occur while configuring or running a lattice.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration value is out of range or malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Rule, state or seed validation failed.
    #[error(transparent)]
    Rule(#[from] RuleError),

    /// Lattice wiring could not be built.
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// The barrier waited longer than the stall timeout for an output.
    #[error("lattice stalled in generation {generation}: no output from positions {missing:?} within {timeout:?}")]
    Stalled {
        generation: u64,
        missing: Vec<usize>,
        timeout: Duration,
    },

    /// The run was cancelled before reaching the generation limit.
    #[error("run cancelled")]
    Cancelled,

    /// A channel to another participant closed while it was still needed.
    #[error("{actor} disconnected during generation {generation}")]
    Disconnected { actor: ActorId, generation: u64 },

    /// A position reported twice in one generation.
    #[error("position {position} reported twice in generation {generation}")]
    DuplicateOutput { position: usize, generation: u64 },

    /// An output from a position the lattice does not have.
    #[error("output from unknown position {position} (lattice size {size})")]
    UnknownPosition { position: usize, size: usize },

    /// A participant is working on a different generation than expected.
    #[error("{actor} is at generation {actual} but generation {expected} was expected")]
    OutOfStep {
        actor: ActorId,
        expected: u64,
        actual: u64,
    },

    /// A relay delivered a value from the wrong generation.
    #[error("cell {reader} read generation {actual} from relay {relay} while computing generation {expected}")]
    StaleRead {
        reader: usize,
        relay: usize,
        expected: u64,
        actual: u64,
    },

    /// An actor task panicked or was aborted.
    #[error("actor task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    /// True for the error the scheduler reports when an actor failure or an
    /// external request cut the run short.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

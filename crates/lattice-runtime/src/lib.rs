//! Lattice Runtime - one actor per cell, relays for neighbor exchange, a barrier per generation
//!
//! # Architecture
//!
//! For a lattice of N positions the runtime spawns 2N tasks and drives them
//! from one scheduler:
//!
//! - **CellActor** (N): owns a position's state. Each generation it emits
//!   the state to the scheduler, publishes it to its own relay, reads its
//!   window from the relays of its neighbors and applies the rule.
//! - **RelayActor** (N): receives one publish per generation and places one
//!   copy into every read slot subscribed to it.
//! - **Scheduler**: releases generation g to every cell, collects exactly
//!   one output from each, forwards the snapshot, and only then releases
//!   g+1.
//!
//! ```text
//!             release(g)                 publish(g)
//! Scheduler ─────────────> CellActor p ─────────────> RelayActor p
//!     ^                        │   ^                       │
//!     └──── output(g) ─────────┘   └──── read(g) ──────────┘  (x reader_count)
//! ```
//!
//! Actors share nothing but the immutable rule table. All coordination is
//! by message, every message carries its generation, and every wait also
//! observes a [`CancellationToken`](tokio_util::sync::CancellationToken).
//!
//! # Usage
//!
//! ```ignore
//! use lattice_runtime::{Lattice, LatticeConfig, History};
//!
//! let lattice = Lattice::new(LatticeConfig::default())?;
//! let mut history = History::new();
//! lattice.run(&mut history).await?;
//! for row in history.generations() {
//!     println!("{row}");
//! }
//! ```

pub mod cell;
pub mod config;
pub mod error;
pub mod jitter;
pub mod lattice;
pub mod message;
pub mod observer;
pub mod relay;
pub mod scheduler;
pub mod telemetry;

pub use cell::{CellActor, CellLinks, Port};
pub use config::LatticeConfig;
pub use error::{ActorId, Error, Result};
pub use jitter::Jitter;
pub use lattice::{Lattice, RunSummary};
pub use message::{Output, Release, Stamped};
pub use observer::{History, Observer, Snapshot};
pub use relay::{Outlet, RelayActor};
pub use scheduler::{BarrierConfig, BarrierEvent, Phase, Scheduler, SchedulerReport};
pub use telemetry::{Telemetry, MAX_TRACKED_ROUNDS};

// Re-export the model crates so callers need a single dependency.
pub use lattice_rule::{CellState, NeighborhoodCode, Row, RuleError, RuleTable, Seed};
pub use lattice_topology::{Adjacency, BoundaryPolicy, TopologyError};

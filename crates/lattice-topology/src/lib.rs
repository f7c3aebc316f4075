//! Lattice Topology
//!
//! Who reads whom on a one-dimensional, radius-1 lattice.
//!
//! # Windows
//!
//! Every position reads a window of three taps. An interior position reads
//! its left neighbor, itself and its right neighbor:
//!
//! ```text
//!            bit 2   bit 1   bit 0
//! p      ->  p-1     p       p+1
//! 0      ->  0       1       zero
//! N-1    ->  N-2     N-1     zero
//! ```
//!
//! A tap either reads the relay of another position or is a constant zero.
//! Reads always come first, so a missing neighbor is one extra left shift
//! after the last read.
//! Boundary handling lives entirely in how windows are built, so actors never
//! branch on their position.
//!
//! # Boundary Policies
//!
//! - [`BoundaryPolicy::ZeroPadded`]: positions 0 and N-1 have one true
//!   neighbor; the missing one contributes a trailing 0 bit.
//! - [`BoundaryPolicy::Ring`]: the lattice wraps around.
//!
//! # Reader Counts
//!
//! Adjacency is mutual, so the number of read slots fed by a relay equals
//! the number of relay reads in its owner's window: 3 for interior
//! positions, 2 for zero-padded boundaries.

mod adjacency;
mod boundary;
mod error;
mod window;

pub use adjacency::{Adjacency, Subscription};
pub use boundary::BoundaryPolicy;
pub use error::TopologyError;
pub use window::{Slot, Tap, Window};

/// Taps per window (radius 1: left, self, right).
pub const WINDOW_TAPS: usize = 3;

/// Relay reads per generation for an interior position.
pub const INTERIOR_READERS: usize = 3;

/// Relay reads per generation for a zero-padded boundary position.
pub const BOUNDARY_READERS: usize = 2;

const _: () = assert!(INTERIOR_READERS == WINDOW_TAPS);
const _: () = assert!(BOUNDARY_READERS + 1 == INTERIOR_READERS);

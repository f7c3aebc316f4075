//! Lock-step and mailbox counters.
//!
//! Actors never read these to make decisions; they only record. Tests and
//! callers inspect them after (or during) a run.

use std::sync::atomic::{AtomicU64, Ordering};

/// Most generations that get per-relay read counters. Reads of later
/// generations are not counted, so long runs keep a bounded footprint.
pub const MAX_TRACKED_ROUNDS: usize = 4096;

/// Counters shared by every actor of one run.
#[derive(Debug)]
pub struct Telemetry {
    /// Per cell: accepted generation + 1 (0 before the first release).
    rounds: Vec<AtomicU64>,
    /// Largest gap seen between a cell entering a round and the slowest cell.
    max_lag: AtomicU64,
    /// `reads[generation][relay]`: completed reads of each relay.
    reads: Vec<Vec<AtomicU64>>,
    /// Per relay: values fanned out.
    publishes: Vec<AtomicU64>,
}

impl Telemetry {
    /// Counters for `size` positions over `rounds` generations (seed included).
    pub fn new(size: usize, rounds: usize) -> Self {
        Self {
            rounds: counters(size),
            max_lag: AtomicU64::new(0),
            reads: (0..rounds).map(|_| counters(size)).collect(),
            publishes: counters(size),
        }
    }

    /// A cell accepted the release for `generation`.
    pub fn enter_round(&self, position: usize, generation: u64) {
        let entered = generation + 1;
        self.rounds[position].store(entered, Ordering::SeqCst);

        // Every other cell stored its previous round before emitting the
        // output that let this release go out, so no load sees anything older.
        let slowest = self
            .rounds
            .iter()
            .map(|round| round.load(Ordering::SeqCst))
            .min()
            .unwrap_or(entered);
        self.max_lag
            .fetch_max(entered.saturating_sub(slowest), Ordering::SeqCst);
    }

    /// A cell finished reading `relay` during `generation`.
    pub fn record_read(&self, relay: usize, generation: u64) {
        let slot = usize::try_from(generation)
            .ok()
            .and_then(|g| self.reads.get(g))
            .and_then(|row| row.get(relay));
        if let Some(counter) = slot {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// A relay finished fanning out one value.
    pub fn record_publish(&self, relay: usize) {
        self.publishes[relay].fetch_add(1, Ordering::SeqCst);
    }

    /// Largest observed gap, in generations, between any two cells.
    pub fn max_lag(&self) -> u64 {
        self.max_lag.load(Ordering::SeqCst)
    }

    /// Generation each cell has accepted, `None` before its first release.
    pub fn rounds(&self) -> Vec<Option<u64>> {
        self.rounds
            .iter()
            .map(|r| r.load(Ordering::SeqCst).checked_sub(1))
            .collect()
    }

    /// Completed reads of `relay` in `generation`.
    pub fn reads(&self, relay: usize, generation: u64) -> u64 {
        usize::try_from(generation)
            .ok()
            .and_then(|g| self.reads.get(g))
            .and_then(|row| row.get(relay))
            .map_or(0, |c| c.load(Ordering::SeqCst))
    }

    /// Values fanned out by `relay` over the whole run.
    pub fn publishes(&self, relay: usize) -> u64 {
        self.publishes[relay].load(Ordering::SeqCst)
    }

    /// Number of generations with read counters.
    pub fn tracked_rounds(&self) -> usize {
        self.reads.len()
    }
}

fn counters(n: usize) -> Vec<AtomicU64> {
    (0..n).map(|_| AtomicU64::new(0)).collect()
}

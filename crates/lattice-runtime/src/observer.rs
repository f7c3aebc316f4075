//! Snapshot observers.

use lattice_rule::Row;
use serde::Serialize;

/// The full lattice after one generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// 1 for the first computed generation.
    pub generation: u64,
    pub row: Row,
}

/// Receives one snapshot per computed generation, 1 through G, in order.
///
/// The seed row is not observed; it is available up front from
/// [`Lattice::seed`](crate::Lattice::seed) and in the run summary.
pub trait Observer {
    fn observe(&mut self, snapshot: &Snapshot);
}

impl<F> Observer for F
where
    F: FnMut(&Snapshot),
{
    fn observe(&mut self, snapshot: &Snapshot) {
        self(snapshot)
    }
}

/// Observer that keeps everything.
#[derive(Debug, Clone, Default)]
pub struct History {
    generations: Vec<Row>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows of generations 1.., in order.
    pub fn generations(&self) -> &[Row] {
        &self.generations
    }

    pub fn into_generations(self) -> Vec<Row> {
        self.generations
    }

    pub fn last(&self) -> Option<&Row> {
        self.generations.last()
    }
}

impl Observer for History {
    fn observe(&mut self, snapshot: &Snapshot) {
        self.generations.push(snapshot.row.clone());
    }
}

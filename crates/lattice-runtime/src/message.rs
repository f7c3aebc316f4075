//! Messages exchanged between the scheduler, cells and relays.
//!
//! Every message carries the generation it belongs to, so a receiver can
//! tell a current value from a stale one without any shared counter.

use std::future::Future;

use lattice_rule::CellState;
use tokio_util::sync::CancellationToken;

/// Scheduler → cell: begin `generation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Release {
    pub generation: u64,
}

/// Cell → scheduler: the state a position held at the start of `generation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Output {
    pub position: usize,
    pub generation: u64,
    pub state: CellState,
}

/// Cell → own relay, and relay → read slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamped {
    pub generation: u64,
    pub state: CellState,
}

/// Await `fut` unless `cancel` fires first. Cancellation wins ties.
pub(crate) async fn until_cancelled<F>(cancel: &CancellationToken, fut: F) -> Option<F::Output>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        out = fut => Some(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completes_when_not_cancelled() {
        let cancel = CancellationToken::new();
        assert_eq!(until_cancelled(&cancel, async { 7 }).await, Some(7));
    }

    #[tokio::test]
    async fn cancellation_wins_ties() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(until_cancelled(&cancel, async { 7 }).await, None);
    }
}

//! Generation barrier.
//!
//! The scheduler drives every cell through the same generation:
//!
//! ```text
//! Idle -> Releasing(0) -> AwaitingOutputs(0) -> Releasing(1) -> ... -> AwaitingOutputs(G) -> Done
//! ```
//!
//! A release for generation g+1 is only sent after all N outputs of
//! generation g have been collected. Round 0 collects the seed row, which
//! stays in the report; rounds 1..=G are forwarded to the observer. Collection is a blocking fan-in: all
//! cells share one output channel, so the scheduler sleeps until the next
//! output arrives instead of polling.
//!
//! After generation G the release channels are closed. Cells finish the
//! generation they are in and exit on the closed channel.

use std::time::Duration;

use lattice_rule::{CellState, Row};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ActorId, Error, Result};
use crate::message::{until_cancelled, Output, Release};
use crate::observer::{Observer, Snapshot};

/// Where the barrier is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Releasing(u64),
    AwaitingOutputs(u64),
    Done,
    Failed,
}

/// One step of the barrier, recorded when tracing is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierEvent {
    ReleaseSent { generation: u64, position: usize },
    OutputCollected { generation: u64, position: usize },
}

impl BarrierEvent {
    pub fn generation(&self) -> u64 {
        match *self {
            Self::ReleaseSent { generation, .. } | Self::OutputCollected { generation, .. } => generation,
        }
    }
}

/// What a completed barrier hands back.
#[derive(Debug, Clone)]
pub struct SchedulerReport {
    /// Generations collected after the seed row.
    pub generations: u64,
    pub seed: Row,
    /// Row of the last collected generation.
    pub last: Row,
    pub trace: Option<Vec<BarrierEvent>>,
}

/// Scheduler configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct BarrierConfig {
    /// Generations to collect after the seed row.
    pub generations: u64,
    /// Longest wait for any single output.
    pub stall_timeout: Option<Duration>,
    pub record_trace: bool,
}

/// Lock-step generation barrier.
pub struct Scheduler {
    config: BarrierConfig,
    releases: Vec<mpsc::Sender<Release>>,
    outputs: mpsc::Receiver<Output>,
    cancel: CancellationToken,
    phase: Phase,
    trace: Option<Vec<BarrierEvent>>,
}

impl Scheduler {
    /// `releases[p]` must reach cell `p`; every cell sends into `outputs`.
    pub fn new(
        config: BarrierConfig,
        releases: Vec<mpsc::Sender<Release>>,
        outputs: mpsc::Receiver<Output>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            trace: config.record_trace.then(Vec::new),
            config,
            releases,
            outputs,
            cancel,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn size(&self) -> usize {
        self.releases.len()
    }

    /// Drive generations 0..=G, forwarding snapshots 1..=G to `observer`.
    ///
    /// On failure every actor is cancelled before the error is returned.
    pub async fn run<O>(&mut self, observer: &mut O) -> Result<SchedulerReport>
    where
        O: Observer + ?Sized,
    {
        match self.drive(observer).await {
            Ok(report) => Ok(report),
            Err(e) => {
                self.phase = Phase::Failed;
                self.cancel.cancel();
                Err(e)
            }
        }
    }

    async fn drive<O>(&mut self, observer: &mut O) -> Result<SchedulerReport>
    where
        O: Observer + ?Sized,
    {
        info!(
            cells = self.size(),
            generations = self.config.generations,
            "barrier starting"
        );

        let mut seed = None;
        let mut last = Row::default();
        for generation in 0..=self.config.generations {
            self.release(generation).await?;
            let row = self.collect(generation).await?;

            if generation == 0 {
                seed = Some(row.clone());
                last = row;
            } else {
                let snapshot = Snapshot { generation, row };
                observer.observe(&snapshot);
                last = snapshot.row;
            }
        }

        // Closing the release channels lets cells finish and exit.
        self.releases.clear();
        self.phase = Phase::Done;
        info!(generations = self.config.generations, "barrier done");

        Ok(SchedulerReport {
            generations: self.config.generations,
            seed: seed.unwrap_or_default(),
            last,
            trace: self.trace.take(),
        })
    }

    async fn release(&mut self, generation: u64) -> Result<()> {
        self.phase = Phase::Releasing(generation);
        debug!(generation, "releasing");

        for (position, tx) in self.releases.iter().enumerate() {
            let sent = until_cancelled(&self.cancel, tx.send(Release { generation }))
                .await
                .ok_or(Error::Cancelled)?;
            sent.map_err(|_| Error::Disconnected {
                actor: ActorId::Cell(position),
                generation,
            })?;
            if let Some(trace) = &mut self.trace {
                trace.push(BarrierEvent::ReleaseSent { generation, position });
            }
        }
        Ok(())
    }

    async fn collect(&mut self, generation: u64) -> Result<Row> {
        self.phase = Phase::AwaitingOutputs(generation);

        let size = self.size();
        let mut slots: Vec<Option<CellState>> = vec![None; size];
        let mut remaining = size;

        while remaining > 0 {
            let output = self.next_output(generation, &slots).await?;

            if output.generation != generation {
                return Err(Error::OutOfStep {
                    actor: ActorId::Cell(output.position),
                    expected: generation,
                    actual: output.generation,
                });
            }
            let slot = slots.get_mut(output.position).ok_or(Error::UnknownPosition {
                position: output.position,
                size,
            })?;
            if slot.replace(output.state).is_some() {
                return Err(Error::DuplicateOutput {
                    position: output.position,
                    generation,
                });
            }
            remaining -= 1;

            if let Some(trace) = &mut self.trace {
                trace.push(BarrierEvent::OutputCollected {
                    generation,
                    position: output.position,
                });
            }
        }

        debug!(generation, "generation collected");
        Ok(slots.into_iter().flatten().collect())
    }

    async fn next_output(&mut self, generation: u64, slots: &[Option<CellState>]) -> Result<Output> {
        let recv = until_cancelled(&self.cancel, self.outputs.recv());
        let received = match self.config.stall_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, recv).await {
                Ok(received) => received,
                Err(_) => {
                    let missing = missing(slots);
                    warn!(generation, ?missing, ?timeout, "barrier stalled");
                    return Err(Error::Stalled {
                        generation,
                        missing,
                        timeout,
                    });
                }
            },
            None => recv.await,
        };

        match received {
            None => Err(Error::Cancelled),
            Some(Some(output)) => Ok(output),
            Some(None) => Err(Error::Disconnected {
                actor: ActorId::Cell(missing(slots).first().copied().unwrap_or_default()),
                generation,
            }),
        }
    }
}

fn missing(slots: &[Option<CellState>]) -> Vec<usize> {
    slots
        .iter()
        .enumerate()
        .filter_map(|(position, slot)| slot.is_none().then_some(position))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::History;

    /// Wire `size` release channels; cells listed in `responsive` echo a fixed state.
    fn barrier(
        size: usize,
        responsive: &[usize],
        config: BarrierConfig,
    ) -> (Scheduler, Vec<mpsc::Receiver<Release>>, CancellationToken) {
        let cancel = CancellationToken::new();
        let (output_tx, output_rx) = mpsc::channel(size);
        let mut release_txs = Vec::new();
        let mut idle = Vec::new();

        for position in 0..size {
            let (tx, mut rx) = mpsc::channel::<Release>(1);
            release_txs.push(tx);
            if responsive.contains(&position) {
                let outputs = output_tx.clone();
                tokio::spawn(async move {
                    while let Some(release) = rx.recv().await {
                        let state = CellState::from_bit((position as u64 + release.generation) as u8);
                        let output = Output { position, generation: release.generation, state };
                        if outputs.send(output).await.is_err() {
                            break;
                        }
                    }
                });
            } else {
                idle.push(rx);
            }
        }

        let scheduler = Scheduler::new(config, release_txs, output_rx, cancel.clone());
        (scheduler, idle, cancel)
    }

    #[tokio::test]
    async fn collects_every_generation_in_order() {
        let config = BarrierConfig { generations: 3, ..Default::default() };
        let (mut scheduler, _idle, _cancel) = barrier(4, &[0, 1, 2, 3], config);
        assert_eq!(scheduler.phase(), Phase::Idle);

        let mut history = History::new();
        let report = scheduler.run(&mut history).await.unwrap();

        assert_eq!(scheduler.phase(), Phase::Done);
        assert_eq!(report.generations, 3);
        assert_eq!(report.seed.bits(), vec![0, 1, 0, 1]);
        assert_eq!(history.generations().len(), 3);
        assert_eq!(history.generations()[0].bits(), vec![1, 0, 1, 0]);
        assert_eq!(&report.last, history.last().unwrap());
    }

    #[tokio::test]
    async fn observer_sees_computed_generations_only() {
        let config = BarrierConfig { generations: 4, ..Default::default() };
        let (mut scheduler, _idle, _cancel) = barrier(3, &[0, 1, 2], config);

        let mut seen = Vec::new();
        let mut observer = |snapshot: &Snapshot| seen.push(snapshot.generation);
        scheduler.run(&mut observer).await.unwrap();

        assert_eq!(seen, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn zero_generations_still_reports_seed() {
        let config = BarrierConfig::default();
        let (mut scheduler, _idle, _cancel) = barrier(2, &[0, 1], config);

        let mut history = History::new();
        let report = scheduler.run(&mut history).await.unwrap();
        assert_eq!(report.generations, 0);
        assert!(history.generations().is_empty());
        assert_eq!(report.seed.bits(), vec![0, 1]);
        assert_eq!(report.last, report.seed);
    }

    #[tokio::test]
    async fn stall_names_missing_positions() {
        let config = BarrierConfig {
            generations: 2,
            stall_timeout: Some(Duration::from_millis(50)),
            record_trace: false,
        };
        let (mut scheduler, _idle, cancel) = barrier(3, &[0, 2], config);

        let err = scheduler.run(&mut History::new()).await.unwrap_err();
        match err {
            Error::Stalled { generation, missing, .. } => {
                assert_eq!(generation, 0);
                assert_eq!(missing, vec![1]);
            }
            other => panic!("expected stall, got {other:?}"),
        }
        assert_eq!(scheduler.phase(), Phase::Failed);
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn external_cancel_stops_collection() {
        let config = BarrierConfig { generations: 5, ..Default::default() };
        let (mut scheduler, _idle, cancel) = barrier(2, &[0], config);

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = scheduler.run(&mut History::new()).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn duplicate_output_rejected() {
        let cancel = CancellationToken::new();
        let (output_tx, output_rx) = mpsc::channel(4);
        let (release_tx, _release_rx) = mpsc::channel(1);
        let (release_tx2, _release_rx2) = mpsc::channel(1);
        let config = BarrierConfig { generations: 1, ..Default::default() };
        let mut scheduler = Scheduler::new(config, vec![release_tx, release_tx2], output_rx, cancel);

        let dup = Output { position: 0, generation: 0, state: CellState::Alive };
        output_tx.send(dup).await.unwrap();
        output_tx.send(dup).await.unwrap();

        let err = scheduler.run(&mut History::new()).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateOutput { position: 0, generation: 0 }));
    }

    #[tokio::test]
    async fn releases_wait_for_full_drain() {
        let config = BarrierConfig { generations: 4, record_trace: true, ..Default::default() };
        let (mut scheduler, _idle, _cancel) = barrier(5, &[0, 1, 2, 3, 4], config);

        let report = scheduler.run(&mut History::new()).await.unwrap();
        let trace = report.trace.unwrap();
        assert_eq!(trace.len(), 5 * 5 * 2);

        for (i, event) in trace.iter().enumerate() {
            if let BarrierEvent::ReleaseSent { generation, .. } = *event {
                let later_drain = trace[i..].iter().any(|e| {
                    matches!(e, BarrierEvent::OutputCollected { .. }) && e.generation() + 1 == generation
                });
                assert!(!later_drain, "release {generation} sent before generation {} drained", generation - 1);
            }
        }
    }
}

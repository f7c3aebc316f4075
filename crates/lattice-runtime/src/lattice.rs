//! Lattice wiring: builds every actor and channel, runs the barrier, joins.

use std::sync::Arc;

use lattice_rule::{Row, RuleTable};
use lattice_topology::{Adjacency, Subscription, Tap};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cell::{CellActor, CellLinks, Port};
use crate::config::LatticeConfig;
use crate::error::{Error, Result};
use crate::jitter::Jitter;
use crate::observer::{History, Observer};
use crate::relay::{Outlet, RelayActor};
use crate::scheduler::{BarrierConfig, BarrierEvent, Scheduler};
use crate::telemetry::{Telemetry, MAX_TRACKED_ROUNDS};

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Generations produced after the seed row.
    pub generations: u64,
    pub seed: Row,
    pub last: Row,
    pub trace: Option<Vec<BarrierEvent>>,
    pub telemetry: Option<Arc<Telemetry>>,
}

/// A validated, ready-to-run lattice.
pub struct Lattice {
    config: LatticeConfig,
    rule: Arc<RuleTable>,
    adjacency: Adjacency,
    seed: Row,
    cancel: CancellationToken,
    telemetry: Option<Arc<Telemetry>>,
}

impl Lattice {
    /// Validate `config` and build the rule table and wiring.
    pub fn new(config: LatticeConfig) -> Result<Self> {
        config.validate()?;
        let rule = Arc::new(RuleTable::from_number(config.rule)?);
        let adjacency = Adjacency::new(config.size, config.boundary)?;
        let seed = config.seed.expand(config.size)?;
        let telemetry = config.telemetry.then(|| {
            let rounds = usize::try_from(config.generations.saturating_add(1))
                .map_or(MAX_TRACKED_ROUNDS, |rounds| rounds.min(MAX_TRACKED_ROUNDS));
            Arc::new(Telemetry::new(config.size, rounds))
        });

        Ok(Self {
            config,
            rule,
            adjacency,
            seed,
            cancel: CancellationToken::new(),
            telemetry,
        })
    }

    pub fn config(&self) -> &LatticeConfig {
        &self.config
    }

    pub fn rule(&self) -> &RuleTable {
        &self.rule
    }

    pub fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    pub fn seed(&self) -> &Row {
        &self.seed
    }

    /// Token that aborts the run when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn telemetry(&self) -> Option<Arc<Telemetry>> {
        self.telemetry.clone()
    }

    /// Run every generation, forwarding snapshots to `observer`.
    ///
    /// Returns only after all actor tasks have exited.
    pub async fn run<O>(self, observer: &mut O) -> Result<RunSummary>
    where
        O: Observer + ?Sized,
    {
        let size = self.adjacency.size();
        info!(
            size,
            rule = self.rule.rule_number(),
            generations = self.config.generations,
            boundary = %self.adjacency.policy(),
            "starting lattice"
        );

        let (output_tx, output_rx) = mpsc::channel(size);
        let mut outlets: Vec<Vec<Outlet>> = (0..size).map(|_| Vec::new()).collect();
        let mut release_txs = Vec::with_capacity(size);
        let mut tasks = JoinSet::new();
        let mut cells = Vec::with_capacity(size);
        let mut publish_rxs = Vec::with_capacity(size);

        for (position, window) in self.adjacency.windows().iter().enumerate() {
            let ports: Vec<Port> = window
                .slots()
                .map(|(slot, tap)| match tap {
                    Tap::Zero => Port::Zero,
                    Tap::Cell(relay) => {
                        let (tx, rx) = mpsc::channel(1);
                        outlets[relay].push(Outlet {
                            subscription: Subscription { reader: position, slot },
                            tx,
                        });
                        Port::Relay { relay, rx }
                    }
                })
                .collect();

            let (release_tx, releases) = mpsc::channel(1);
            let (publish, publish_rx) = mpsc::channel(1);
            release_txs.push(release_tx);
            publish_rxs.push(publish_rx);

            let links = CellLinks {
                releases,
                outputs: output_tx.clone(),
                publish,
                ports,
            };
            let jitter = Jitter::new(self.config.jitter, self.config.jitter_seed, position as u64);
            cells.push(
                CellActor::new(position, self.seed[position], Arc::clone(&self.rule), links, self.cancel.clone())
                    .with_telemetry(self.telemetry.clone())
                    .with_jitter(jitter),
            );
        }
        // Only cells hold output senders; the channel closes when they all exit.
        drop(output_tx);

        for (position, (inbox, relay_outlets)) in publish_rxs.into_iter().zip(outlets).enumerate() {
            let relay = RelayActor::new(
                position,
                inbox,
                relay_outlets,
                self.cancel.clone(),
                self.telemetry.clone(),
            );
            debug_assert_eq!(relay.reader_count(), self.adjacency.reader_count(position));
            spawn_actor(&mut tasks, &self.cancel, relay.run());
        }
        for cell in cells {
            spawn_actor(&mut tasks, &self.cancel, cell.run());
        }
        debug!(tasks = tasks.len(), "actors spawned");

        let barrier = BarrierConfig {
            generations: self.config.generations,
            stall_timeout: self.config.stall_timeout,
            record_trace: self.config.record_trace,
        };
        let mut scheduler = Scheduler::new(barrier, release_txs, output_rx, self.cancel.clone());
        let outcome = scheduler.run(observer).await;
        drop(scheduler);

        let actor_error = join_all(&mut tasks).await;

        match (outcome, actor_error) {
            (Ok(report), None) => {
                info!(generations = report.generations, "lattice finished");
                Ok(RunSummary {
                    generations: report.generations,
                    seed: report.seed,
                    last: report.last,
                    trace: report.trace,
                    telemetry: self.telemetry,
                })
            }
            // An actor failure cancels the run; report the cause, not the cancellation.
            (Err(e), Some(cause)) if e.is_cancelled() => Err(cause),
            (Err(e), _) => Err(e),
            (Ok(_), Some(cause)) => Err(cause),
        }
    }

    /// Run to completion, keeping every row.
    pub async fn run_to_history(self) -> Result<(History, RunSummary)> {
        let mut history = History::new();
        let summary = self.run(&mut history).await?;
        Ok((history, summary))
    }
}

/// Spawn an actor; a failing actor cancels the rest of the lattice.
fn spawn_actor<F>(tasks: &mut JoinSet<Result<()>>, cancel: &CancellationToken, actor: F)
where
    F: std::future::Future<Output = Result<()>> + Send + 'static,
{
    let cancel = cancel.clone();
    tasks.spawn(async move {
        let result = actor.await;
        if result.is_err() {
            cancel.cancel();
        }
        result
    });
}

/// Wait for every task; return the first failure.
async fn join_all(tasks: &mut JoinSet<Result<()>>) -> Option<Error> {
    let mut first = None;
    while let Some(joined) = tasks.join_next().await {
        let failure = match joined {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(e) => Some(Error::Join(e)),
        };
        if let Some(e) = failure {
            warn!(error = %e, "actor failed");
            first.get_or_insert(e);
        }
    }
    first
}

//! Cell actor: one per lattice position.
//!
//! Each generation, strictly in this order:
//!
//! 1. wait for the scheduler's release
//! 2. emit the current state to the scheduler
//! 3. publish the current state to the cell's own relay
//! 4. read every relay tap of the window, left to right
//! 5. fold the taps into a neighborhood code (trailing zero taps shift in
//!    the missing neighbors)
//! 6. look the code up in the rule table and advance
//!
//! A closed release channel is the normal shutdown signal. The cancellation
//! token is observed at every wait.

use std::sync::Arc;

use lattice_rule::{CellState, NeighborhoodCode, RuleTable};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::{ActorId, Error, Result};
use crate::jitter::Jitter;
use crate::message::{until_cancelled, Output, Release, Stamped};
use crate::telemetry::Telemetry;

/// One tap of the cell's window, already wired to a relay slot.
#[derive(Debug)]
pub enum Port {
    /// Read slot fed by the relay of `relay`.
    Relay {
        relay: usize,
        rx: mpsc::Receiver<Stamped>,
    },
    /// Missing neighbor: a 0 bit, no read.
    Zero,
}

impl Port {
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Relay { .. })
    }
}

/// Channels connecting a cell to the rest of the lattice.
#[derive(Debug)]
pub struct CellLinks {
    pub releases: mpsc::Receiver<Release>,
    pub outputs: mpsc::Sender<Output>,
    pub publish: mpsc::Sender<Stamped>,
    pub ports: Vec<Port>,
}

/// Actor owning the state of one position.
pub struct CellActor {
    position: usize,
    state: CellState,
    generation: u64,
    rule: Arc<RuleTable>,
    links: CellLinks,
    cancel: CancellationToken,
    telemetry: Option<Arc<Telemetry>>,
    jitter: Jitter,
}

/// Why a cell stopped.
enum Stop {
    Shutdown,
    Cancelled,
}

impl CellActor {
    pub fn new(
        position: usize,
        state: CellState,
        rule: Arc<RuleTable>,
        links: CellLinks,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            position,
            state,
            generation: 0,
            rule,
            links,
            cancel,
            telemetry: None,
            jitter: Jitter::disabled(),
        }
    }

    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Option<Arc<Telemetry>>) -> Self {
        self.telemetry = telemetry;
        self
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn state(&self) -> CellState {
        self.state
    }

    /// Generation of the current state.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Relay reads per generation.
    pub fn read_count(&self) -> usize {
        self.links.ports.iter().filter(|p| p.is_read()).count()
    }

    /// Run generations until released no more or cancelled.
    pub async fn run(mut self) -> Result<()> {
        loop {
            match self.step().await {
                Ok(None) => {}
                Ok(Some(Stop::Shutdown)) => {
                    debug!(cell = self.position, generation = self.generation, "cell finished");
                    return Ok(());
                }
                Ok(Some(Stop::Cancelled)) => {
                    debug!(cell = self.position, generation = self.generation, "cell cancelled");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One full generation. `Some` means the cell should stop.
    async fn step(&mut self) -> Result<Option<Stop>> {
        let generation = self.generation;

        // 1. release
        let Some(received) = until_cancelled(&self.cancel, self.links.releases.recv()).await else {
            return Ok(Some(Stop::Cancelled));
        };
        let Some(release) = received else {
            return Ok(Some(Stop::Shutdown));
        };
        if release.generation != generation {
            return Err(Error::OutOfStep {
                actor: ActorId::Cell(self.position),
                expected: generation,
                actual: release.generation,
            });
        }
        if let Some(telemetry) = &self.telemetry {
            telemetry.enter_round(self.position, generation);
        }

        // 2. emit
        let output = Output {
            position: self.position,
            generation,
            state: self.state,
        };
        match until_cancelled(&self.cancel, self.links.outputs.send(output)).await {
            None => return Ok(Some(Stop::Cancelled)),
            Some(sent) => sent.map_err(|_| Error::Disconnected {
                actor: ActorId::Scheduler,
                generation,
            })?,
        }

        // 3. publish
        if until_cancelled(&self.cancel, self.jitter.pause()).await.is_none() {
            return Ok(Some(Stop::Cancelled));
        }
        let stamped = Stamped {
            generation,
            state: self.state,
        };
        match until_cancelled(&self.cancel, self.links.publish.send(stamped)).await {
            None => return Ok(Some(Stop::Cancelled)),
            Some(sent) => sent.map_err(|_| Error::Disconnected {
                actor: ActorId::Relay(self.position),
                generation,
            })?,
        }

        // 4 + 5. read taps into a code
        let mut code = NeighborhoodCode::ZERO;
        for port in &mut self.links.ports {
            let bit = match port {
                Port::Zero => CellState::Dead,
                Port::Relay { relay, rx } => {
                    if until_cancelled(&self.cancel, self.jitter.pause()).await.is_none() {
                        return Ok(Some(Stop::Cancelled));
                    }
                    let Some(received) = until_cancelled(&self.cancel, rx.recv()).await else {
                        return Ok(Some(Stop::Cancelled));
                    };
                    let value = received.ok_or(Error::Disconnected {
                        actor: ActorId::Relay(*relay),
                        generation,
                    })?;
                    if value.generation != generation {
                        return Err(Error::StaleRead {
                            reader: self.position,
                            relay: *relay,
                            expected: generation,
                            actual: value.generation,
                        });
                    }
                    if let Some(telemetry) = &self.telemetry {
                        telemetry.record_read(*relay, generation);
                    }
                    value.state
                }
            };
            code = code.push(bit);
        }

        // 6. advance
        let next = self.rule.next_state(code);
        trace!(
            cell = self.position,
            generation,
            code = code.value(),
            from = self.state.bit(),
            to = next.bit(),
            "computed"
        );
        self.state = next;
        self.generation += 1;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Harness {
        releases: mpsc::Sender<Release>,
        outputs: mpsc::Receiver<Output>,
        published: mpsc::Receiver<Stamped>,
        slots: Vec<mpsc::Sender<Stamped>>,
        cancel: CancellationToken,
    }

    /// Position 0 of a zero-padded lattice: window `[relay 0, relay 1, Zero]`,
    /// with relays played by the test.
    fn left_edge_cell(state: CellState, rule: u8) -> (CellActor, Harness) {
        let (release_tx, releases) = mpsc::channel(1);
        let (outputs, output_rx) = mpsc::channel(1);
        let (publish, published) = mpsc::channel(1);
        let (self_tx, self_rx) = mpsc::channel(1);
        let (right_tx, right_rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        let links = CellLinks {
            releases,
            outputs,
            publish,
            ports: vec![
                Port::Relay { relay: 0, rx: self_rx },
                Port::Relay { relay: 1, rx: right_rx },
                Port::Zero,
            ],
        };
        let cell = CellActor::new(0, state, Arc::new(RuleTable::new(rule)), links, cancel.clone());
        let harness = Harness {
            releases: release_tx,
            outputs: output_rx,
            published,
            slots: vec![self_tx, right_tx],
            cancel,
        };
        (cell, harness)
    }

    #[tokio::test]
    async fn follows_emit_publish_read_order() {
        let (cell, mut h) = left_edge_cell(CellState::Alive, 30);
        assert_eq!(cell.read_count(), 2);
        let handle = tokio::spawn(cell.run());

        h.releases.send(Release { generation: 0 }).await.unwrap();
        let out = h.outputs.recv().await.unwrap();
        assert_eq!(out, Output { position: 0, generation: 0, state: CellState::Alive });
        let published = h.published.recv().await.unwrap();
        assert_eq!(published, Stamped { generation: 0, state: CellState::Alive });

        // Self 1, right 0, pad 0 -> code 0b100 -> rule 30 gives 1.
        h.slots[0].send(published).await.unwrap();
        h.slots[1].send(Stamped { generation: 0, state: CellState::Dead }).await.unwrap();

        h.releases.send(Release { generation: 1 }).await.unwrap();
        let out = h.outputs.recv().await.unwrap();
        assert_eq!(out.generation, 1);
        assert_eq!(out.state, CellState::Alive);

        drop(h.releases);
        h.slots[0].send(Stamped { generation: 1, state: CellState::Alive }).await.unwrap();
        h.slots[1].send(Stamped { generation: 1, state: CellState::Alive }).await.unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn stale_read_is_an_error() {
        let (cell, mut h) = left_edge_cell(CellState::Dead, 30);
        let handle = tokio::spawn(cell.run());

        h.releases.send(Release { generation: 0 }).await.unwrap();
        h.outputs.recv().await.unwrap();
        h.published.recv().await.unwrap();
        h.slots[0].send(Stamped { generation: 7, state: CellState::Dead }).await.unwrap();

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            Error::StaleRead { reader: 0, relay: 0, expected: 0, actual: 7 }
        ));
    }

    #[tokio::test]
    async fn wrong_release_generation_is_out_of_step() {
        let (cell, h) = left_edge_cell(CellState::Dead, 30);
        let handle = tokio::spawn(cell.run());

        h.releases.send(Release { generation: 2 }).await.unwrap();
        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::OutOfStep { expected: 0, actual: 2, .. }));
    }

    #[tokio::test]
    async fn cancellation_while_reading_exits_cleanly() {
        let (cell, mut h) = left_edge_cell(CellState::Dead, 30);
        let handle = tokio::spawn(cell.run());

        h.releases.send(Release { generation: 0 }).await.unwrap();
        h.outputs.recv().await.unwrap();
        h.published.recv().await.unwrap();
        // Cell is now parked on its first relay read.
        h.cancel.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn closed_release_channel_is_shutdown() {
        let (cell, h) = left_edge_cell(CellState::Alive, 30);
        assert_eq!(cell.position(), 0);
        assert_eq!(cell.state(), CellState::Alive);
        assert_eq!(cell.generation(), 0);
        drop(h.releases);
        cell.run().await.unwrap();
    }
}

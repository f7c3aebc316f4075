//! Relay actor: one broadcast mailbox per position.
//!
//! The owning cell publishes once per generation. The relay then places one
//! copy into every read slot subscribed to it. Each slot is a channel of
//! capacity one, so the relay holds exactly `reader_count` buffered values:
//! the publisher never waits on an individual reader, and every reader gets
//! exactly one value per generation.
//!
//! A reader that falls behind simply leaves its slot full; the relay waits
//! on that slot before delivering the next generation, which keeps the
//! per-slot order equal to generation order.

use std::sync::Arc;

use lattice_topology::Subscription;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::{ActorId, Error, Result};
use crate::message::{until_cancelled, Stamped};
use crate::telemetry::Telemetry;

/// One read slot fed by a relay.
#[derive(Debug)]
pub struct Outlet {
    pub subscription: Subscription,
    pub tx: mpsc::Sender<Stamped>,
}

/// Fan-out mailbox for the state of one position.
pub struct RelayActor {
    position: usize,
    inbox: mpsc::Receiver<Stamped>,
    outlets: Vec<Outlet>,
    generation: u64,
    cancel: CancellationToken,
    telemetry: Option<Arc<Telemetry>>,
}

impl RelayActor {
    pub fn new(
        position: usize,
        inbox: mpsc::Receiver<Stamped>,
        outlets: Vec<Outlet>,
        cancel: CancellationToken,
        telemetry: Option<Arc<Telemetry>>,
    ) -> Self {
        Self {
            position,
            inbox,
            outlets,
            generation: 0,
            cancel,
            telemetry,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Copies delivered per generation.
    pub fn reader_count(&self) -> usize {
        self.outlets.len()
    }

    /// Relay until the owner stops publishing or the run is cancelled.
    pub async fn run(mut self) -> Result<()> {
        loop {
            let Some(published) = until_cancelled(&self.cancel, self.inbox.recv()).await else {
                debug!(relay = self.position, generation = self.generation, "relay cancelled");
                return Ok(());
            };
            let Some(value) = published else {
                break;
            };

            if value.generation != self.generation {
                return Err(Error::OutOfStep {
                    actor: ActorId::Relay(self.position),
                    expected: self.generation,
                    actual: value.generation,
                });
            }

            for outlet in &self.outlets {
                let Some(sent) = until_cancelled(&self.cancel, outlet.tx.send(value)).await else {
                    debug!(relay = self.position, generation = self.generation, "relay cancelled mid fan-out");
                    return Ok(());
                };
                sent.map_err(|_| Error::Disconnected {
                    actor: ActorId::Cell(outlet.subscription.reader),
                    generation: value.generation,
                })?;
            }

            trace!(
                relay = self.position,
                generation = value.generation,
                state = value.state.bit(),
                readers = self.outlets.len(),
                "relayed"
            );
            if let Some(telemetry) = &self.telemetry {
                telemetry.record_publish(self.position);
            }
            self.generation += 1;
        }

        debug!(relay = self.position, generations = self.generation, "relay drained");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_rule::CellState;
    use lattice_topology::Slot;

    fn wired(readers: usize) -> (RelayActor, mpsc::Sender<Stamped>, Vec<mpsc::Receiver<Stamped>>, CancellationToken) {
        let cancel = CancellationToken::new();
        let (publish_tx, inbox) = mpsc::channel(1);
        let mut outlets = Vec::new();
        let mut slots = Vec::new();
        for reader in 0..readers {
            let (tx, rx) = mpsc::channel(1);
            outlets.push(Outlet {
                subscription: Subscription { reader, slot: Slot::Middle },
                tx,
            });
            slots.push(rx);
        }
        let relay = RelayActor::new(0, inbox, outlets, cancel.clone(), None);
        (relay, publish_tx, slots, cancel)
    }

    fn stamped(generation: u64, state: CellState) -> Stamped {
        Stamped { generation, state }
    }

    #[tokio::test]
    async fn delivers_exactly_one_copy_per_reader() {
        let (relay, publish, mut slots, _cancel) = wired(3);
        let handle = tokio::spawn(relay.run());

        publish.send(stamped(0, CellState::Alive)).await.unwrap();
        for slot in &mut slots {
            assert_eq!(slot.recv().await, Some(stamped(0, CellState::Alive)));
        }
        // Nothing extra was buffered.
        for slot in &mut slots {
            assert!(slot.try_recv().is_err());
        }

        drop(publish);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn publisher_does_not_wait_for_readers() {
        let (relay, publish, mut slots, _cancel) = wired(2);
        let handle = tokio::spawn(relay.run());

        // Both generations are accepted before anyone reads; the second one
        // waits inside the relay until the slots drain.
        publish.send(stamped(0, CellState::Alive)).await.unwrap();
        publish.send(stamped(1, CellState::Dead)).await.unwrap();

        for slot in &mut slots {
            assert_eq!(slot.recv().await.unwrap().generation, 0);
        }
        for slot in &mut slots {
            assert_eq!(slot.recv().await.unwrap(), stamped(1, CellState::Dead));
        }

        drop(publish);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn rejects_out_of_order_publish() {
        let (relay, publish, _slots, _cancel) = wired(1);
        let handle = tokio::spawn(relay.run());

        publish.send(stamped(3, CellState::Alive)).await.unwrap();
        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::OutOfStep { expected: 0, actual: 3, .. }));
    }

    #[tokio::test]
    async fn cancellation_unblocks_full_slot() {
        let (relay, publish, _slots, cancel) = wired(1);
        let handle = tokio::spawn(relay.run());

        publish.send(stamped(0, CellState::Alive)).await.unwrap();
        publish.send(stamped(1, CellState::Alive)).await.unwrap();
        // Slot still holds generation 0, so the relay is parked on generation 1.
        cancel.cancel();
        handle.await.unwrap().unwrap();
    }
}

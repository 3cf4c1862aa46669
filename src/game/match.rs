//! Duel state and authoritative tick loop

use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::ws::protocol::Snapshot;

use super::world::{DuelRules, IntentOutcome, MatchPhase, SlotId, World};
use super::{DuelError, Intent};

/// Snapshots buffered per subscriber before it starts lagging
const SNAPSHOT_BUFFER: usize = 64;

/// The single running duel.
///
/// All access to the world goes through one mutex, shared by the input
/// handlers and the tick loop. The lock is never held across an await.
pub struct Duel {
    id: Uuid,
    tick_period: Duration,
    world: Mutex<World>,
    snapshot_tx: broadcast::Sender<Snapshot>,
    ready_tx: watch::Sender<bool>,
}

impl Duel {
    pub fn new(rules: DuelRules, tick_period: Duration) -> Self {
        let (snapshot_tx, _) = broadcast::channel(SNAPSHOT_BUFFER);
        let (ready_tx, _) = watch::channel(false);

        Self {
            id: Uuid::new_v4(),
            tick_period,
            world: Mutex::new(World::new(rules)),
            snapshot_tx,
            ready_tx,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Claim a participant slot. Fails once both slots are filled.
    pub fn register(&self, name: Option<&str>) -> Result<SlotId, DuelError> {
        let (slot, ready) = {
            let mut world = self.world.lock();
            let slot = world.register(name)?;
            (slot, world.is_ready())
        };

        info!(match_id = %self.id, slot = %slot, "Participant registered");

        if ready {
            self.ready_tx.send_replace(true);
        }
        Ok(slot)
    }

    /// Apply one decoded intent for `slot` under the world lock
    pub fn submit(&self, slot: SlotId, intent: Intent) -> Result<IntentOutcome, DuelError> {
        let outcome = self.world.lock().apply_intent(slot, intent)?;
        debug!(slot = %slot, ?intent, ?outcome, "Intent applied");
        Ok(outcome)
    }

    /// Receive every snapshot produced from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Current state, consistent with the last completed tick or intent
    pub fn snapshot(&self) -> Snapshot {
        self.world.lock().snapshot()
    }

    pub fn phase(&self) -> MatchPhase {
        self.world.lock().phase()
    }

    pub fn registered(&self) -> usize {
        self.world.lock().registered()
    }

    pub fn tick_count(&self) -> u64 {
        self.world.lock().tick_count()
    }

    /// Wait for both participants, then tick until `shutdown` flips.
    ///
    /// Keeps ticking after the match is decided; the terminal snapshot is
    /// repeated until the process stops.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ready_rx = self.ready_tx.subscribe();

        info!(match_id = %self.id, "Waiting for participants");
        tokio::select! {
            ready = async { ready_rx.wait_for(|ready| *ready).await.is_ok() } => {
                if !ready {
                    return;
                }
            }
            _ = stop_requested(&mut shutdown) => {
                info!(match_id = %self.id, "Shutdown before match start");
                return;
            }
        }

        info!(match_id = %self.id, "Match started");

        let mut ticker = interval_at(Instant::now() + self.tick_period, self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = stop_requested(&mut shutdown) => break,
            }

            let (report, snapshot) = {
                let mut world = self.world.lock();
                let report = world.tick();
                (report, world.snapshot())
            };

            for hit in &report.hits {
                info!(
                    match_id = %self.id,
                    tick = report.tick,
                    shooter = %hit.shooter,
                    target = %hit.target,
                    x = hit.x,
                    y = hit.y,
                    remaining_hp = hit.remaining_hp,
                    "Hit"
                );
            }
            if let Some(message) = &report.finished {
                info!(match_id = %self.id, tick = report.tick, %message, "Match finished");
            }

            // Err only means nobody is subscribed right now
            let _ = self.snapshot_tx.send(snapshot);
        }

        info!(match_id = %self.id, "Tick loop stopped");
    }
}

/// Resolves once the stop flag is raised or its sender is gone
pub async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

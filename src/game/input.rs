//! Per-participant input handler

use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::ws::protocol::decode_frame;

use super::r#match::{stop_requested, Duel};
use super::world::SlotId;

/// Counters for one handler's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputStats {
    /// Intents that reached the world (including dropped attacks on cooldown)
    pub applied: u64,
    /// Lines that did not decode
    pub malformed: u64,
    /// Well-formed messages with an action we do not know
    pub ignored: u64,
}

/// Feed frames from one participant into the duel until the stream ends
/// or the stop flag is raised.
///
/// Each frame is decoded line by line. Bad lines are dropped; the handler
/// never gives up on a participant because of them.
pub async fn run_input_handler<S>(
    duel: &Duel,
    slot: SlotId,
    frames: S,
    mut shutdown: watch::Receiver<bool>,
) -> InputStats
where
    S: Stream<Item = String>,
{
    let mut frames = std::pin::pin!(frames);
    let mut stats = InputStats::default();

    loop {
        let frame = tokio::select! {
            frame = frames.next() => frame,
            _ = stop_requested(&mut shutdown) => break,
        };
        let Some(frame) = frame else {
            break;
        };

        for decoded in decode_frame(&frame) {
            let msg = match decoded {
                Ok(msg) => msg,
                Err(e) => {
                    stats.malformed += 1;
                    warn!(slot = %slot, error = %e, "Dropping malformed intent");
                    continue;
                }
            };

            let Some(intent) = msg.into_intent() else {
                stats.ignored += 1;
                debug!(slot = %slot, "Ignoring unknown action");
                continue;
            };

            match duel.submit(slot, intent) {
                Ok(_) => stats.applied += 1,
                Err(e) => warn!(slot = %slot, error = %e, "Intent rejected"),
            }
        }
    }

    debug!(slot = %slot, ?stats, "Input handler finished");
    stats
}

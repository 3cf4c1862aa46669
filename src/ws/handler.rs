//! WebSocket upgrade handler

use std::borrow::Cow;
use std::fmt::Display;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::{IntoResponse, Response},
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::app::AppState;
use crate::game::input::run_input_handler;
use crate::game::world::SLOT_COUNT;
use crate::game::SlotId;
use crate::http::routes::AppError;
use crate::ws::protocol::Snapshot;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Display name, defaults to the slot name
    pub name: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    // Cheap early rejection; the slot itself is claimed after the upgrade
    if state.duel.registered() >= SLOT_COUNT {
        warn!("WebSocket upgrade refused, match full");
        return AppError::Conflict("Match is full".to_string()).into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, query.name, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(mut socket: WebSocket, name: Option<String>, state: AppState) {
    let slot = match state.duel.register(name.as_deref()) {
        Ok(slot) => slot,
        Err(e) => {
            warn!(error = %e, "Slot lost during upgrade");
            let _ = socket.send(match_full_close()).await;
            return;
        }
    };

    info!(slot = %slot, "New WebSocket connection");

    // Subscribe before splitting so no tick slips through
    let snapshot_rx = state.duel.subscribe();
    let (ws_sink, ws_stream) = socket.split();

    // Writer: broadcast snapshots -> WebSocket
    let writer_handle = tokio::spawn(forward_snapshots(slot, ws_sink, snapshot_rx));

    // Reader: WebSocket frames -> input handler
    let stats = run_input_handler(
        &state.duel,
        slot,
        client_frames(slot, ws_stream),
        state.shutdown.clone(),
    )
    .await;
    debug!(slot = %slot, ?stats, "Reader finished");

    // The participant stays in the arena; only the writer goes away
    writer_handle.abort();

    info!(slot = %slot, "WebSocket connection closed");
}

/// Close frame sent to a client that lost the race for the last slot
fn match_full_close() -> Message {
    Message::Close(Some(CloseFrame {
        code: close_code::AGAIN,
        reason: Cow::from("match full"),
    }))
}

/// Forward every broadcast snapshot to `sink` until the channel closes or a
/// send fails. A failed send only ends the writer; input keeps flowing.
async fn forward_snapshots<S>(slot: SlotId, mut sink: S, mut snapshot_rx: broadcast::Receiver<Snapshot>)
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    loop {
        match snapshot_rx.recv().await {
            Ok(snapshot) => {
                if let Err(e) = send_snapshot(&mut sink, &snapshot).await {
                    debug!(slot = %slot, error = %e, "WebSocket send failed");
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(
                    slot = %slot,
                    lagged_count = n,
                    "Client lagged, skipping {} snapshots", n
                );
                // Continue - the next snapshot is a full state anyway
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!(slot = %slot, "Snapshot channel closed");
                break;
            }
        }
    }
    let _ = sink.close().await;
}

/// Send one snapshot as a single JSON text frame
async fn send_snapshot<S>(sink: &mut S, snapshot: &Snapshot) -> Result<(), String>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let json = serde_json::to_string(snapshot).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}

/// Text payloads from the client until it closes or the socket errors.
/// Binary frames are accepted when they hold UTF-8.
fn client_frames<S>(slot: SlotId, ws_stream: S) -> impl Stream<Item = String>
where
    S: Stream<Item = Result<Message, axum::Error>>,
{
    ws_stream
        .take_while(move |result| {
            let keep_going = match result {
                Ok(Message::Close(_)) => {
                    info!(slot = %slot, "Client initiated close");
                    false
                }
                Err(e) => {
                    warn!(slot = %slot, error = %e, "WebSocket error");
                    false
                }
                Ok(_) => true,
            };
            futures::future::ready(keep_going)
        })
        .filter_map(move |result| {
            let frame = match result {
                Ok(Message::Text(text)) => Some(text),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => Some(text),
                    Err(_) => {
                        warn!(slot = %slot, "Received non UTF-8 binary message, ignoring");
                        None
                    }
                },
                _ => None,
            };
            futures::future::ready(frame)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Duel, DuelRules};
    use futures::channel::mpsc;
    use futures::stream;
    use std::time::Duration;
    use tokio::sync::watch;
    use tokio::time::timeout;
    use tokio_test::assert_ok;

    const MOVE_DOWN: &str = r#"{"action":"move","direction":"down"}"#;

    fn blank_snapshot(message: &str) -> Snapshot {
        Snapshot {
            arena_width: 20,
            arena_height: 10,
            players: Vec::new(),
            projectiles: Vec::new(),
            message: message.to_string(),
        }
    }

    #[test]
    fn lost_race_closes_with_try_again() {
        let Message::Close(Some(frame)) = match_full_close() else {
            panic!("expected a close frame");
        };
        assert_eq!(frame.code, 1013);
        assert_eq!(frame.reason, "match full");
    }

    #[tokio::test]
    async fn snapshots_go_out_as_json_text_frames() {
        let (tx, rx) = broadcast::channel(4);
        let (sink, mut sent) = mpsc::unbounded::<Message>();

        tx.send(blank_snapshot("")).unwrap();
        tx.send(blank_snapshot("Player1 wins!")).unwrap();
        drop(tx);

        forward_snapshots(SlotId::FIRST, sink, rx).await;

        let mut texts = Vec::new();
        while let Some(msg) = sent.next().await {
            let Message::Text(text) = msg else {
                panic!("expected a text frame");
            };
            texts.push(text);
        }
        assert_eq!(texts.len(), 2);
        assert!(!texts[1].ends_with('\n'));
        let decoded: Snapshot = serde_json::from_str(&texts[1]).unwrap();
        assert_eq!(decoded, blank_snapshot("Player1 wins!"));
    }

    #[tokio::test]
    async fn lagging_writer_resumes_with_latest() {
        let (tx, rx) = broadcast::channel(1);
        let (sink, sent) = mpsc::unbounded::<Message>();

        tx.send(blank_snapshot("old")).unwrap();
        tx.send(blank_snapshot("new")).unwrap();
        drop(tx);

        forward_snapshots(SlotId::FIRST, sink, rx).await;

        let frames: Vec<Message> = sent.collect().await;
        assert_eq!(frames.len(), 1);
        let Message::Text(text) = &frames[0] else {
            panic!("expected a text frame");
        };
        assert!(text.contains("\"new\""));
    }

    #[tokio::test(start_paused = true)]
    async fn dead_socket_stops_writer_but_not_reader() {
        let duel = Duel::new(DuelRules::default(), Duration::from_millis(100));
        duel.register(None).unwrap();
        duel.register(None).unwrap();

        // Receiving half already gone, so the first send fails
        let (sink, sent) = mpsc::unbounded::<Message>();
        drop(sent);
        let (tx, rx) = broadcast::channel(4);
        let writer = tokio::spawn(forward_snapshots(SlotId::FIRST, sink, rx));
        tx.send(duel.snapshot()).unwrap();

        // The channel is still open; only the failed send can end the writer
        assert_ok!(assert_ok!(timeout(Duration::from_secs(1), writer).await));

        let (_stop_tx, stop_rx) = watch::channel(false);
        let incoming = stream::iter(vec![
            Ok(Message::Text(MOVE_DOWN.to_string())),
            Ok(Message::Binary(MOVE_DOWN.as_bytes().to_vec())),
        ]);
        let stats =
            run_input_handler(&duel, SlotId::FIRST, client_frames(SlotId::FIRST, incoming), stop_rx)
                .await;
        assert_eq!(stats.applied, 2);
        assert_eq!(duel.snapshot().players[0].y, 7);
        drop(tx);
    }

    #[tokio::test]
    async fn reader_accepts_utf8_binary_and_stops_at_close() {
        let incoming = stream::iter(vec![
            Ok(Message::Text(MOVE_DOWN.to_string())),
            Ok(Message::Binary(MOVE_DOWN.as_bytes().to_vec())),
            Ok(Message::Binary(vec![0xff, 0xfe])),
            Ok(Message::Ping(vec![1])),
            Ok(Message::Close(None)),
            Ok(Message::Text("after close".to_string())),
        ]);

        let frames: Vec<String> = client_frames(SlotId::SECOND, incoming).collect().await;
        assert_eq!(frames, vec![MOVE_DOWN.to_string(), MOVE_DOWN.to_string()]);
    }

    #[tokio::test]
    async fn reader_stops_at_socket_error() {
        let incoming = stream::iter(vec![
            Ok(Message::Text(MOVE_DOWN.to_string())),
            Err(axum::Error::new(std::io::Error::other("reset"))),
            Ok(Message::Text(MOVE_DOWN.to_string())),
        ]);

        let frames: Vec<String> = client_frames(SlotId::FIRST, incoming).collect().await;
        assert_eq!(frames.len(), 1);
    }
}

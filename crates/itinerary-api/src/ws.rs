// ── WebSocket gateway ────────────────────────────────────────────────────
// A single `/ws` upgrade point; clients subscribe to topics (`itinerary.<id>`,
// `agent.<run_id>`, `chat.<id>`) with a small text frame and receive the
// matching `BusEvent`s as JSON, plus a heartbeat every 30s (spec.md §6.2).
// Grounded on the pack's echo-session-ws-gateway's split-socket/forwarding-
// task shape.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;

use crate::state::AppState;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame {
    Subscribe { topic: String },
    Unsubscribe { topic: String },
}

pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();

    let mut forward_task = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let mut subscriptions: Vec<tokio::task::JoinHandle<()>> = Vec::new();
    let heartbeat_tx = tx.clone();
    let mut heartbeat = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(HEARTBEAT_INTERVAL);
        loop {
            ticker.tick().await;
            if heartbeat_tx.send("{\"type\":\"heartbeat\"}".to_string()).is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientFrame>(&text) {
                Ok(ClientFrame::Subscribe { topic }) => {
                    let rx = state.bus.subscribe(&topic);
                    let forward = tx.clone();
                    subscriptions.push(tokio::spawn(forward_topic(topic, rx, forward)));
                }
                Ok(ClientFrame::Unsubscribe { .. }) => {
                    // Individual unsubscribe is a no-op here; the socket's
                    // own close tears down every forwarding task below.
                }
                Err(e) => {
                    log::warn!("[ws] ignoring malformed client frame: {e}");
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    for handle in subscriptions {
        handle.abort();
    }
    heartbeat.abort();
    forward_task.abort();
}

async fn forward_topic(topic: String, mut rx: broadcast::Receiver<itinerary_engine::bus::BusEvent>, tx: tokio::sync::mpsc::UnboundedSender<String>) {
    loop {
        match rx.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(text) => {
                    if tx.send(text).is_err() {
                        break;
                    }
                }
                Err(e) => log::warn!("[ws] failed to serialize event for topic {topic}: {e}"),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                log::warn!("[ws] subscriber for {topic} lagged, skipped {skipped} events");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

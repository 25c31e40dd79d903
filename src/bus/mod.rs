// ── Event Bus / Broadcaster (C7) ────────────────────────────────────────────
// Process-local pub/sub keyed by topic string, grounded on the teacher's
// preference for `parking_lot::Mutex` over `std::sync::Mutex`/an async mutex
// for all shared in-process registries (`DailyTokenTracker`,
// `PendingApprovals` in `engine/state.rs`).
//
// `publish` is synchronous and never blocks: `broadcast::Sender::send`
// returns immediately, and its only failure mode (no receivers) is ignored,
// same as the teacher's fire-and-forget `app_handle.emit(...).ok()`. A slow
// subscriber only loses its own oldest events (`RecvError::Lagged`) — it can
// never stall the publisher or other subscribers.

pub mod events;

use std::collections::HashMap;

use log::trace;
use parking_lot::Mutex;
use tokio::sync::broadcast;

pub use events::{agent_topic, chat_topic, itinerary_topic, AgentEvent, AgentEventStatus, BusEvent, ChatBroadcast, ItineraryEvent};

const CHANNEL_CAPACITY: usize = 256;

pub struct EventBus {
    channels: Mutex<HashMap<String, broadcast::Sender<BusEvent>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self { channels: Mutex::new(HashMap::new()) }
    }

    /// Publish `event` to `topic`. Non-blocking; a topic with no current
    /// subscribers simply drops the event.
    pub fn publish(&self, topic: &str, event: BusEvent) {
        let channels = self.channels.lock();
        if let Some(sender) = channels.get(topic) {
            if sender.send(event).is_err() {
                trace!("[bus] publish to \"{topic}\" had no subscribers");
            }
        }
    }

    /// Subscribe to `topic`, creating its channel on first use. The
    /// returned receiver observes every event published after this call,
    /// in publish order, until it lags behind or is dropped.
    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<BusEvent> {
        let mut channels = self.channels.lock();
        channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }
}

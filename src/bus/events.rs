// ── Event Bus: Event Payloads ──────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::model::{Diff, ChangeSet};

/// Published on `itinerary.<id>` whenever an `apply`/`undo` durably commits
/// a new version (spec.md §4.3 step 6, §4.7).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItineraryEvent {
    Patch { itinerary_id: String, to_version: u64, diff: Diff },
    GenerationComplete { itinerary_id: String, to_version: u64 },
    DayCompleted { itinerary_id: String, day: u32 },
    PhaseTransition { itinerary_id: String, phase: String },
}

/// Published on `agent.<id>` for every lifecycle step of an agent run
/// (spec.md §4.5).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum AgentEventStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentEvent {
    pub agent_id: String,
    pub kind: String,
    pub status: AgentEventStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    pub timestamp: i64,
    pub itinerary_id: String,
}

/// Published on `chat.<id>` so other tabs/collaborators observe the result
/// of a chat-driven change (spec.md §4.6, §4.7).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatBroadcast {
    pub itinerary_id: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_set: Option<ChangeSet>,
    pub applied: bool,
}

/// The envelope carried by every broadcast channel regardless of topic
/// family — subscribers match on the variant they care about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum BusEvent {
    Itinerary(ItineraryEvent),
    Agent(AgentEvent),
    Chat(ChatBroadcast),
}

pub fn itinerary_topic(itinerary_id: &str) -> String {
    format!("itinerary.{itinerary_id}")
}

pub fn agent_topic(run_id: &str) -> String {
    format!("agent.{run_id}")
}

pub fn chat_topic(itinerary_id: &str) -> String {
    format!("chat.{itinerary_id}")
}

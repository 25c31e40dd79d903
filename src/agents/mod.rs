// ── Agents (C5) ─────────────────────────────────────────────────────────────
// One capability trait plus a kind enum, replacing deep agent-class
// inheritance with a single type and variants (spec.md §9 Design Notes).
// Agents never touch the Store directly — the only way an agent influences
// an itinerary is by submitting a `ChangeSet` through the Change Engine
// (spec.md §4.5 "Agent ↔ Engine contract").

pub mod enrichment;
pub mod planner;

pub use enrichment::EnrichmentAgent;
pub use planner::{PlannerAgent, PlannerMode};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ai::ProviderChain;
use crate::atoms::error::EngineResult;
use crate::bus::{agent_topic, AgentEvent, AgentEventStatus, BusEvent, EventBus};
use crate::engine::ChangeEngine;
use crate::model::{ChangeSet, Diff};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Planner,
    Enrichment,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Planner => "planner",
            AgentKind::Enrichment => "enrichment",
        }
    }
}

pub struct AgentContext {
    pub run_id: String,
    pub itinerary_id: String,
    pub engine: Arc<ChangeEngine>,
    pub ai: Arc<ProviderChain>,
    pub bus: Arc<EventBus>,
    /// Natural-language request text, for Planner modification mode.
    pub request_text: Option<String>,
    pub day: Option<u32>,
    /// If true, the agent submits its ChangeSet via `apply` directly; if
    /// false it returns the ChangeSet unapplied for the orchestrator to
    /// preview (spec.md §4.6 "Application").
    pub auto_apply: bool,
}

#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub change_set: Option<ChangeSet>,
    pub applied: bool,
    pub to_version: Option<u64>,
    /// Preview diff from `propose`, populated only when the agent's
    /// ChangeSet was not applied (spec.md §4.6 step 4: "return the
    /// ChangeSet and a preview diff... for the client to confirm").
    pub diff: Option<Diff>,
    pub message: String,
    pub warnings: Vec<String>,
}

#[async_trait]
pub trait Agent: Send + Sync {
    fn kind(&self) -> AgentKind;
    async fn run(&self, ctx: AgentContext) -> EngineResult<AgentOutcome>;
}

/// Publishes one `AgentEvent` lifecycle transition to `agent.<run_id>`
/// (spec.md §4.5: `queued → running → (succeeded | failed)` with progress
/// checkpoints).
pub(crate) fn publish_progress(
    bus: &EventBus,
    kind: AgentKind,
    run_id: &str,
    itinerary_id: &str,
    status: AgentEventStatus,
    progress: u8,
    step: Option<&str>,
    message: Option<&str>,
) {
    bus.publish(
        &agent_topic(run_id),
        BusEvent::Agent(AgentEvent {
            agent_id: run_id.to_string(),
            kind: kind.as_str().to_string(),
            status,
            progress,
            message: message.map(str::to_string),
            step: step.map(str::to_string),
            timestamp: now_ms(),
            itinerary_id: itinerary_id.to_string(),
        }),
    );
}

fn now_ms() -> i64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).map(|d| d.as_millis() as i64).unwrap_or(0)
}

/// Registry used by the Orchestrator to dispatch by `AgentKind` without a
/// match arm per caller (spec.md §9 Design Notes).
pub struct AgentRegistry {
    planner: PlannerAgent,
    enrichment: EnrichmentAgent,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self { planner: PlannerAgent, enrichment: EnrichmentAgent }
    }

    pub async fn run(&self, kind: AgentKind, ctx: AgentContext) -> EngineResult<AgentOutcome> {
        match kind {
            AgentKind::Planner => self.planner.run(ctx).await,
            AgentKind::Enrichment => self.enrichment.run(ctx).await,
        }
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

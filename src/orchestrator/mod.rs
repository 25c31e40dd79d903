// ── Orchestrator (C6) ────────────────────────────────────────────────────
// `route(ChatRequest) -> ChatResponse` — intent classification, reference
// resolution, dispatch to agents, and response assembly (spec.md §4.6).

pub mod intent;
pub mod reference;

pub use intent::Intent;
pub use reference::NodeCandidate;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::agents::{AgentContext, AgentKind, AgentRegistry};
use crate::ai::ProviderChain;
use crate::atoms::constants::MAX_CHAT_TEXT_LEN;
use crate::atoms::error::EngineError;
use crate::bus::{chat_topic, BusEvent, ChatBroadcast, EventBus};
use crate::engine::ChangeEngine;
use crate::model::{ChangeScope, ChangeSet, Diff};

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub itinerary_id: String,
    pub scope: ChangeScope,
    #[serde(default)]
    pub day: Option<u32>,
    #[serde(default)]
    pub selected_node_id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub auto_apply: bool,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ChatResponse {
    pub intent: Option<Intent>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_set: Option<ChangeSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<Diff>,
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_version: Option<u64>,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub needs_disambiguation: bool,
    #[serde(default)]
    pub candidates: Vec<NodeCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

pub struct Orchestrator {
    engine: Arc<ChangeEngine>,
    agents: Arc<AgentRegistry>,
    ai: Arc<ProviderChain>,
    bus: Arc<EventBus>,
    run_counter: AtomicU64,
}

impl Orchestrator {
    pub fn new(engine: Arc<ChangeEngine>, agents: Arc<AgentRegistry>, ai: Arc<ProviderChain>, bus: Arc<EventBus>) -> Self {
        Self { engine, agents, ai, bus, run_counter: AtomicU64::new(0) }
    }

    fn next_run_id(&self) -> String {
        let n = self.run_counter.fetch_add(1, Ordering::Relaxed);
        format!("run-{n}")
    }

    pub async fn route(&self, request: ChatRequest) -> ChatResponse {
        if let Err(msg) = validate_request(&request) {
            return ChatResponse { message: msg.clone(), errors: Some(vec![msg]), ..Default::default() };
        }

        let intent = intent::classify(&request.text, &self.ai).await;

        let itinerary = match self.engine.peek(&request.itinerary_id) {
            Ok(Some(it)) => it,
            Ok(None) => {
                let msg = format!("itinerary \"{}\" not found", request.itinerary_id);
                return ChatResponse { intent: Some(intent), message: msg.clone(), errors: Some(vec![msg]), ..Default::default() };
            }
            Err(e) => {
                let msg = e.to_string();
                return ChatResponse { intent: Some(intent), message: msg.clone(), errors: Some(vec![msg]), ..Default::default() };
            }
        };

        let needs_reference = !matches!(intent, Intent::Explain | Intent::Unknown);
        if needs_reference {
            let candidates = reference::resolve(&itinerary, &request.text, request.day, request.selected_node_id.as_deref());
            if reference::needs_disambiguation(&candidates) {
                return ChatResponse {
                    intent: Some(intent),
                    message: "Multiple matching nodes found; please select one.".to_string(),
                    needs_disambiguation: true,
                    candidates,
                    ..Default::default()
                };
            }
        }

        if matches!(intent, Intent::Explain) {
            let message = explain(&itinerary, &request.text);
            return ChatResponse { intent: Some(intent), message, applied: false, ..Default::default() };
        }

        if matches!(intent, Intent::Unknown) {
            return ChatResponse {
                intent: Some(intent),
                message: "I couldn't determine what change you'd like to make.".to_string(),
                ..Default::default()
            };
        }

        let ctx = AgentContext {
            run_id: self.next_run_id(),
            itinerary_id: request.itinerary_id.clone(),
            engine: self.engine.clone(),
            ai: self.ai.clone(),
            bus: self.bus.clone(),
            request_text: Some(request.text.clone()),
            day: request.day,
            auto_apply: request.auto_apply,
        };

        let outcome = match self.agents.run(AgentKind::Planner, ctx).await {
            Ok(o) => o,
            Err(e) => {
                let msg = e.to_string();
                return ChatResponse {
                    intent: Some(intent),
                    message: format!("Could not produce changes: {msg}"),
                    errors: Some(vec![msg]),
                    ..Default::default()
                };
            }
        };

        let response = ChatResponse {
            intent: Some(intent),
            message: outcome.message.clone(),
            change_set: outcome.change_set.clone(),
            diff: outcome.diff.clone(),
            applied: outcome.applied,
            to_version: outcome.to_version,
            warnings: outcome.warnings,
            needs_disambiguation: false,
            candidates: vec![],
            errors: None,
        };

        self.bus.publish(
            &chat_topic(&request.itinerary_id),
            BusEvent::Chat(ChatBroadcast {
                itinerary_id: request.itinerary_id.clone(),
                message: response.message.clone(),
                change_set: response.change_set.clone(),
                applied: response.applied,
            }),
        );

        response
    }
}

fn validate_request(request: &ChatRequest) -> Result<(), String> {
    if request.text.trim().is_empty() || request.text.len() > MAX_CHAT_TEXT_LEN {
        return Err(format!("text must be non-empty and at most {MAX_CHAT_TEXT_LEN} characters"));
    }
    if matches!(request.scope, ChangeScope::Day) && request.day.is_none() {
        return Err("day is required when scope=day".to_string());
    }
    Ok(())
}

fn explain(itinerary: &crate::model::Itinerary, _text: &str) -> String {
    format!(
        "This itinerary has {} day(s) and is currently at version {}.",
        itinerary.days.len(),
        itinerary.version
    )
}

impl From<EngineError> for ChatResponse {
    fn from(e: EngineError) -> Self {
        ChatResponse { message: e.to_string(), errors: Some(vec![e.to_string()]), ..Default::default() }
    }
}

// ── Planner Agent ────────────────────────────────────────────────────────
// Two modes (spec.md §4.5 "Planner Agent"):
//   - initial generation: full document from a creation request
//   - modification: a ChangeSet from a natural-language request, validated
//     against locked nodes before being returned or applied

use async_trait::async_trait;
use serde::Deserialize;

use crate::atoms::error::{EngineError, EngineResult};
use crate::bus::AgentEventStatus;
use crate::model::{Author, ChangeSet, Day};

use super::{publish_progress, Agent, AgentContext, AgentKind, AgentOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerMode {
    InitialGeneration,
    Modification,
}

pub struct PlannerAgent;

#[derive(Deserialize)]
struct GeneratedDocument {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    currency: String,
    #[serde(default)]
    themes: Vec<String>,
    #[serde(default)]
    days: Vec<Day>,
}

const GENERATION_SCHEMA_HINT: &str = "itinerary document schema: {summary, currency, themes, days:[{day_number,date,location,nodes:[...]}]}";
const MODIFICATION_SCHEMA_HINT: &str = "change_set schema: {scope, day?, ops:[{op,...}], preferences, author}";

#[async_trait]
impl Agent for PlannerAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Planner
    }

    async fn run(&self, ctx: AgentContext) -> EngineResult<AgentOutcome> {
        publish_progress(&ctx.bus, self.kind(), &ctx.run_id, &ctx.itinerary_id, AgentEventStatus::Running, 0, Some("start"), None);

        let mode = if ctx.request_text.is_none() { PlannerMode::InitialGeneration } else { PlannerMode::Modification };
        let result = match mode {
            PlannerMode::InitialGeneration => self.run_initial_generation(&ctx).await,
            PlannerMode::Modification => self.run_modification(&ctx).await,
        };

        match &result {
            Ok(outcome) => {
                publish_progress(&ctx.bus, self.kind(), &ctx.run_id, &ctx.itinerary_id, AgentEventStatus::Succeeded, 100, Some("done"), Some(&outcome.message));
            }
            Err(e) => {
                publish_progress(&ctx.bus, self.kind(), &ctx.run_id, &ctx.itinerary_id, AgentEventStatus::Failed, 100, Some("error"), Some(&e.to_string()));
            }
        }
        result
    }
}

impl PlannerAgent {
    async fn run_initial_generation(&self, ctx: &AgentContext) -> EngineResult<AgentOutcome> {
        let system = "You are a travel planner. Respond with JSON only, matching the given schema.";
        let user = "Generate a complete itinerary document for the requested trip.";
        let raw = ctx.ai.generate_structured(system, user, GENERATION_SCHEMA_HINT).await?;

        let doc: GeneratedDocument = serde_json::from_str(&raw)
            .map_err(|e| EngineError::AgentFailure(format!("planner: generated document failed schema validation: {e}")))?;

        let result = ctx
            .engine
            .replace_document(&ctx.itinerary_id, doc.summary, doc.currency, doc.themes, doc.days, Author::Agent)
            .await?;

        Ok(AgentOutcome {
            change_set: None,
            applied: true,
            to_version: Some(result.to_version),
            diff: None,
            message: format!("Generated itinerary, now at version {}", result.to_version),
            warnings: result.diff.warnings,
        })
    }

    async fn run_modification(&self, ctx: &AgentContext) -> EngineResult<AgentOutcome> {
        let request_text = ctx.request_text.as_deref().unwrap_or_default();
        let system = "You are a travel planner assistant. Respond with a JSON ChangeSet only, matching the given schema.";
        let user = format!("Current request: {request_text}");
        let raw = ctx.ai.generate_structured(system, &user, MODIFICATION_SCHEMA_HINT).await?;

        let mut change_set: ChangeSet = serde_json::from_str(&raw)
            .map_err(|e| EngineError::AgentFailure(format!("planner: generated change set failed schema validation: {e}")))?;
        change_set.author = Author::Agent;

        self.reject_locked_targets(ctx, &change_set)?;

        if ctx.auto_apply {
            let result = ctx.engine.apply(&ctx.itinerary_id, &change_set).await?;
            Ok(AgentOutcome {
                change_set: Some(change_set),
                applied: true,
                to_version: Some(result.to_version),
                diff: Some(result.diff.clone()),
                message: format!("Applied changes, now at version {}", result.to_version),
                warnings: result.diff.warnings,
            })
        } else {
            let preview = ctx.engine.propose(&ctx.itinerary_id, &change_set)?;
            Ok(AgentOutcome {
                change_set: Some(change_set),
                applied: false,
                to_version: None,
                diff: Some(preview.diff.clone()),
                message: "Proposed changes ready for review".to_string(),
                warnings: preview.diff.warnings,
            })
        }
    }

    /// The agent self-polices against locked targets even though the
    /// engine independently re-enforces the same gate on `apply`
    /// (spec.md §4.5 "Modification").
    fn reject_locked_targets(&self, ctx: &AgentContext, change_set: &ChangeSet) -> EngineResult<()> {
        let Some(itinerary) = ctx.engine.peek(&ctx.itinerary_id)? else {
            return Err(EngineError::not_found(format!("itinerary \"{}\" not found", ctx.itinerary_id)));
        };
        for op in &change_set.ops {
            if !op.is_destructive_or_mutating() {
                continue;
            }
            if let Some(id) = op.target_id() {
                if let Some((node, _)) = itinerary.find_node(id) {
                    if node.locked {
                        return Err(EngineError::AgentFailure(format!(
                            "generated change set targets locked node \"{id}\"; discarding instead of submitting"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

// ── Change Engine (C3) ──────────────────────────────────────────────────────
// propose / apply / undo over a Store and an EventBus, serialized per
// itinerary by `lock::LockTable`. This is the heart of the core (spec.md
// §4.3): the only component permitted to mutate a persisted Itinerary.

mod lock;
mod ops;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use log::{info, warn};

use crate::atoms::error::{EngineError, EngineResult};
use crate::bus::{itinerary_topic, BusEvent, EventBus, ItineraryEvent};
use crate::model::{self, Author, ChangeSet, Diff, Itinerary, Revision};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct ProposeResult {
    pub proposed: Itinerary,
    pub diff: Diff,
    pub preview_version: u64,
}

#[derive(Debug, Clone)]
pub struct ApplyResult {
    pub to_version: u64,
    pub diff: Diff,
}

pub struct ChangeEngine {
    store: Arc<Store>,
    bus: Arc<EventBus>,
    locks: lock::LockTable,
}

impl ChangeEngine {
    pub fn new(store: Arc<Store>, bus: Arc<EventBus>) -> Self {
        Self { store, bus, locks: lock::LockTable::new() }
    }

    fn load(&self, itinerary_id: &str) -> EngineResult<Itinerary> {
        self.store
            .get(itinerary_id)?
            .ok_or_else(|| EngineError::not_found(format!("itinerary \"{itinerary_id}\" not found")))
    }

    /// Unlocked read of the current document (spec.md §5: reads take no
    /// lock and may observe any consistent historical snapshot). Used by
    /// agents and the orchestrator for context gathering outside the
    /// write critical section.
    pub fn peek(&self, itinerary_id: &str) -> EngineResult<Option<Itinerary>> {
        self.store.get(itinerary_id)
    }

    /// Pure computation: loads the current document, applies the ops in
    /// memory, and returns the hypothetical result without persisting,
    /// bumping the version, or publishing an event (spec.md §4.3).
    pub fn propose(&self, itinerary_id: &str, change_set: &ChangeSet) -> EngineResult<ProposeResult> {
        let mut itinerary = self.load(itinerary_id)?;
        let now_ms = now_ms();
        let diff = ops::apply_change_set(&mut itinerary, change_set, now_ms)?;
        model::validate::validate_itinerary(&itinerary)?;
        let preview_version = itinerary.version + 1;
        Ok(ProposeResult { proposed: itinerary, diff, preview_version })
    }

    /// Transactional: under the per-itinerary exclusive section, loads,
    /// applies, validates, persists, appends a revision, and publishes a
    /// patch event (spec.md §4.3 "apply").
    pub async fn apply(&self, itinerary_id: &str, change_set: &ChangeSet) -> EngineResult<ApplyResult> {
        let _guard = self.locks.acquire(itinerary_id).await;

        let mut itinerary = self.load(itinerary_id)?;
        let from_version = itinerary.version;
        let now_ms = now_ms();

        // An empty ChangeSet is a no-op: no persisted write, no version
        // bump, no published event (spec.md §8 L3).
        if change_set.ops.is_empty() {
            return Ok(ApplyResult { to_version: from_version, diff: Diff::empty(from_version) });
        }

        let diff = ops::apply_change_set(&mut itinerary, change_set, now_ms)?;
        itinerary.version = from_version + 1;
        itinerary.updated_at = now_ms;
        model::validate::validate_itinerary(&itinerary)?;

        let revision = Revision {
            itinerary_id: itinerary_id.to_string(),
            version: itinerary.version,
            timestamp: now_ms,
            description: describe_ops(change_set),
            author: change_set.author.clone(),
            diff: diff.clone(),
            snapshot: itinerary.clone(),
        };
        self.store.save_and_append(&itinerary, &revision)?;

        info!("[engine] itinerary {itinerary_id} advanced to version {}", itinerary.version);
        for warning in &diff.warnings {
            warn!("[engine] itinerary {itinerary_id}: {warning}");
        }

        self.bus.publish(
            &itinerary_topic(itinerary_id),
            BusEvent::Itinerary(ItineraryEvent::Patch {
                itinerary_id: itinerary_id.to_string(),
                to_version: itinerary.version,
                diff: diff.clone(),
            }),
        );

        Ok(ApplyResult { to_version: itinerary.version, diff })
    }

    /// Initial generation writes a whole new document over the current one
    /// in a single versioned step, rather than a sequence of per-node
    /// `insert`s with no anchor to insert after (spec.md §4.5 "Planner
    /// Agent": "writes via apply of a single replace-document ChangeSet
    /// authored by agent"). Implemented as its own transactional path
    /// through the same load → validate → save_and_append → publish
    /// sequence as `apply`, respecting locks is moot here since the
    /// itinerary starts with no nodes to lock.
    pub async fn replace_document(
        &self,
        itinerary_id: &str,
        summary: String,
        currency: String,
        themes: Vec<String>,
        days: Vec<model::Day>,
        author: Author,
    ) -> EngineResult<ApplyResult> {
        let _guard = self.locks.acquire(itinerary_id).await;

        let mut itinerary = self.load(itinerary_id)?;
        let now_ms = now_ms();
        itinerary.summary = summary;
        itinerary.currency = currency;
        itinerary.themes = themes;
        itinerary.days = days;
        itinerary.version += 1;
        itinerary.updated_at = now_ms;
        itinerary.status = model::ItineraryStatus::Completed;
        model::validate::validate_itinerary(&itinerary)?;

        let mut diff = Diff::empty(itinerary.version);
        for day in &itinerary.days {
            for node in &day.nodes {
                diff.added.push(model::NodeRef { node_id: node.id.clone(), day: day.day_number });
            }
        }

        let revision = Revision {
            itinerary_id: itinerary_id.to_string(),
            version: itinerary.version,
            timestamp: now_ms,
            description: "Initial generation".to_string(),
            author,
            diff: diff.clone(),
            snapshot: itinerary.clone(),
        };
        self.store.save_and_append(&itinerary, &revision)?;

        info!("[engine] itinerary {itinerary_id} generated, now at version {}", itinerary.version);
        self.bus.publish(
            &itinerary_topic(itinerary_id),
            BusEvent::Itinerary(ItineraryEvent::GenerationComplete { itinerary_id: itinerary_id.to_string(), to_version: itinerary.version }),
        );

        Ok(ApplyResult { to_version: itinerary.version, diff })
    }

    /// Loads the snapshot at `to_version` (or `currentVersion - 1` if
    /// omitted) from the revision log and writes it forward as a new
    /// version — undo is itself a forward-moving change, so a further undo
    /// acts as redo (spec.md §4.3 "undo").
    pub async fn undo(&self, itinerary_id: &str, to_version: Option<u64>) -> EngineResult<ApplyResult> {
        let _guard = self.locks.acquire(itinerary_id).await;

        let current = self.load(itinerary_id)?;
        let target_version = to_version.unwrap_or_else(|| current.version.saturating_sub(1));
        let target_revision = self
            .store
            .get_revision(itinerary_id, target_version)?
            .ok_or_else(|| EngineError::not_found(format!("no revision at version {target_version} for \"{itinerary_id}\"")))?;

        let now_ms = now_ms();
        let mut restored = target_revision.snapshot;
        restored.version = current.version + 1;
        restored.updated_at = now_ms;

        let diff = diff_for_undo(&current, &restored);

        let revision = Revision {
            itinerary_id: itinerary_id.to_string(),
            version: restored.version,
            timestamp: now_ms,
            description: format!("Undo to version {target_version}"),
            author: Author::System,
            diff: diff.clone(),
            snapshot: restored.clone(),
        };
        self.store.save_and_append(&restored, &revision)?;

        info!("[engine] itinerary {itinerary_id} undone to version {target_version}, now at {}", restored.version);

        self.bus.publish(
            &itinerary_topic(itinerary_id),
            BusEvent::Itinerary(ItineraryEvent::Patch {
                itinerary_id: itinerary_id.to_string(),
                to_version: restored.version,
                diff: diff.clone(),
            }),
        );

        Ok(ApplyResult { to_version: restored.version, diff })
    }
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn describe_ops(change_set: &ChangeSet) -> String {
    let verbs: Vec<&str> = change_set
        .ops
        .iter()
        .map(|op| match op {
            model::ChangeOperation::Insert { .. } => "insert",
            model::ChangeOperation::Delete { .. } => "delete",
            model::ChangeOperation::Move { .. } => "move",
            model::ChangeOperation::Update { .. } => "update",
            model::ChangeOperation::Replace { .. } => "replace",
            model::ChangeOperation::UpdateEdge { .. } => "update_edge",
        })
        .collect();
    if verbs.is_empty() {
        "no-op change set".to_string()
    } else {
        verbs.join(", ")
    }
}

/// A best-effort diff describing what undo changed — full node-by-node
/// reconciliation is not required for the diff's purpose of display/audit.
fn diff_for_undo(before: &Itinerary, after: &Itinerary) -> Diff {
    let mut diff = Diff::empty(after.version);
    let before_ids: std::collections::HashSet<&str> =
        before.days.iter().flat_map(|d| d.nodes.iter()).map(|n| n.id.as_str()).collect();
    let after_ids: std::collections::HashSet<&str> =
        after.days.iter().flat_map(|d| d.nodes.iter()).map(|n| n.id.as_str()).collect();

    for day in &after.days {
        for node in &day.nodes {
            if !before_ids.contains(node.id.as_str()) {
                diff.added.push(model::NodeRef { node_id: node.id.clone(), day: day.day_number });
            }
        }
    }
    for day in &before.days {
        for node in &day.nodes {
            if !after_ids.contains(node.id.as_str()) {
                diff.removed.push(model::NodeRef { node_id: node.id.clone(), day: day.day_number });
            }
        }
    }
    diff
}

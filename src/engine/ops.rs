// ── Change Engine: ChangeSet application ───────────────────────────────────
// Pure in-memory evaluation of a ChangeSet against an Itinerary, shared by
// `propose` (discarded) and `apply` (persisted). No I/O here.

use crate::atoms::error::{EngineError, EngineResult};
use crate::model::{
    Author, ChangeOperation, ChangePreferences, ChangeSet, Diff, Itinerary, NodeRef, UpdatedNode,
};

/// Apply every op in `change_set` to `itinerary` in place, returning the
/// diff against the document's prior state. Non-edge ops run in a first
/// pass left-to-right; `update_edge` ops run in a second pass so they can
/// reference nodes introduced earlier in the same set (spec.md §4.3
/// "Ordering").
pub(crate) fn apply_change_set(
    itinerary: &mut Itinerary,
    change_set: &ChangeSet,
    now_ms: i64,
) -> EngineResult<Diff> {
    let to_version = itinerary.version + 1;
    let mut diff = Diff::empty(to_version);
    let prefs = &change_set.preferences;

    let (edge_ops, node_ops): (Vec<&ChangeOperation>, Vec<&ChangeOperation>) = change_set
        .ops
        .iter()
        .partition(|op| matches!(op, ChangeOperation::UpdateEdge { .. }));

    for op in node_ops {
        apply_node_op(itinerary, op, change_set.author.clone(), prefs, now_ms, &mut diff)?;
    }
    for op in edge_ops {
        apply_edge_op(itinerary, op, prefs, &mut diff)?;
    }

    Ok(diff)
}

fn day_index_of(itinerary: &Itinerary, node_id: &str) -> Option<usize> {
    itinerary.find_node(node_id).map(|(_, idx)| idx)
}

/// True when `preferences.respect_locks` (default true) should drop this op
/// because it targets a locked node with a destructive/mutating verb
/// (spec.md §4.3's "Respect-locks gate").
fn gated_by_lock(itinerary: &Itinerary, op: &ChangeOperation, prefs: &ChangePreferences) -> bool {
    if !prefs.respect_locks || !op.is_destructive_or_mutating() {
        return false;
    }
    op.target_id()
        .and_then(|id| itinerary.find_node(id))
        .map(|(node, _)| node.locked)
        .unwrap_or(false)
}

/// UserFirst tie-break (spec.md §4.3): when this ChangeSet's author
/// disagrees with the last author to touch the target node, and one side
/// is `User`, `preferences.user_first` (default true) decides whose intent
/// wins. Only meaningful for destructive/mutating ops — inserts create new
/// nodes and have no prior author to conflict with.
fn loses_to_user_first(itinerary: &Itinerary, op: &ChangeOperation, set_author: &Author, prefs: &ChangePreferences) -> bool {
    if !op.is_destructive_or_mutating() {
        return false;
    }
    let Some(id) = op.target_id() else { return false };
    let Some((node, _)) = itinerary.find_node(id) else { return false };
    if &node.updated_by == set_author {
        return false;
    }
    let conflict_involves_user = matches!(node.updated_by, Author::User) || matches!(set_author, Author::User);
    if !conflict_involves_user {
        return false;
    }
    // Default true: the agent op yields to the standing user edit.
    prefs.user_first && matches!(set_author, Author::Agent) && matches!(node.updated_by, Author::User)
}

fn apply_node_op(
    itinerary: &mut Itinerary,
    op: &ChangeOperation,
    author: Author,
    prefs: &ChangePreferences,
    now_ms: i64,
    diff: &mut Diff,
) -> EngineResult<()> {
    if gated_by_lock(itinerary, op, prefs) {
        let id = op.target_id().unwrap_or("?").to_string();
        diff.warnings.push(format!("op on locked node \"{id}\" was skipped (respect_locks=true)"));
        return Ok(());
    }
    if loses_to_user_first(itinerary, op, &author, prefs) {
        let id = op.target_id().unwrap_or("?").to_string();
        diff.warnings.push(format!(
            "op on node \"{id}\" yielded to a standing user edit (preferences.user_first=true)"
        ));
        return Ok(());
    }

    match op {
        ChangeOperation::Insert { after, node } => {
            let day_idx = day_index_of(itinerary, after)
                .ok_or_else(|| EngineError::validation(format!("insert: no node with id \"{after}\" to insert after")))?;
            let day = &mut itinerary.days[day_idx];
            let pos = day.node_index(after).expect("just located by day_index_of");
            let mut new_node = node.clone();
            new_node.updated_by = author;
            new_node.updated_at = now_ms;
            let day_number = day.day_number;
            day.nodes.insert(pos + 1, new_node.clone());
            diff.added.push(NodeRef { node_id: new_node.id, day: day_number });
        }
        ChangeOperation::Delete { id } => {
            let Some(day_idx) = day_index_of(itinerary, id) else {
                diff.warnings.push(format!("delete: node \"{id}\" does not exist, treated as no-op"));
                return Ok(());
            };
            let day = &mut itinerary.days[day_idx];
            let day_number = day.day_number;
            day.nodes.retain(|n| &n.id != id);
            day.edges.retain(|e| &e.from != id && &e.to != id);
            diff.removed.push(NodeRef { node_id: id.clone(), day: day_number });
        }
        ChangeOperation::Move { id, start_time, end_time, after } => {
            let day_idx = day_index_of(itinerary, id)
                .ok_or_else(|| EngineError::validation(format!("move: no node with id \"{id}\"")))?;

            if let Some(after_id) = after {
                let target_day_idx = day_index_of(itinerary, after_id)
                    .ok_or_else(|| EngineError::validation(format!("move: no node with id \"{after_id}\" to move after")))?;
                let target_day_date = itinerary.days[target_day_idx].date.clone();
                let mut node = {
                    let day = &mut itinerary.days[day_idx];
                    let pos = day.node_index(id).expect("located above");
                    day.nodes.remove(pos)
                };
                if let Some(st) = start_time {
                    node.timing.start_time = Some(st.resolve(&target_day_date)?);
                }
                if let Some(et) = end_time {
                    node.timing.end_time = Some(et.resolve(&target_day_date)?);
                }
                node.updated_by = author;
                node.updated_at = now_ms;
                let day_number;
                {
                    let target_day = &mut itinerary.days[target_day_idx];
                    let pos = target_day.node_index(after_id).expect("located above");
                    day_number = target_day.day_number;
                    target_day.nodes.insert(pos + 1, node.clone());
                }
                diff.updated.push(UpdatedNode {
                    node_ref: NodeRef { node_id: node.id, day: day_number },
                    changed_fields: vec!["timing".into(), "position".into()],
                });
            } else {
                let day_date = itinerary.days[day_idx].date.clone();
                let day = &mut itinerary.days[day_idx];
                let day_number = day.day_number;
                let pos = day.node_index(id).expect("located above");
                let node = &mut day.nodes[pos];
                if let Some(st) = start_time {
                    node.timing.start_time = Some(st.resolve(&day_date)?);
                }
                if let Some(et) = end_time {
                    node.timing.end_time = Some(et.resolve(&day_date)?);
                }
                node.updated_by = author;
                node.updated_at = now_ms;
                diff.updated.push(UpdatedNode {
                    node_ref: NodeRef { node_id: id.clone(), day: day_number },
                    changed_fields: vec!["timing".into()],
                });
            }
        }
        ChangeOperation::Update { id, patch } => {
            let day_idx = day_index_of(itinerary, id)
                .ok_or_else(|| EngineError::validation(format!("update: no node with id \"{id}\"")))?;
            let day = &mut itinerary.days[day_idx];
            let day_number = day.day_number;
            let node = day.find_node_mut(id).expect("located above");
            let mut changed_fields = Vec::new();

            if let Some(target) = &patch.status {
                if !node.can_transition_to(target) {
                    return Err(EngineError::validation(format!(
                        "update: node \"{id}\" cannot transition from {:?} to {:?}",
                        node.status, target
                    )));
                }
                node.status = target.clone();
                changed_fields.push("status".to_string());
            }
            if let Some(v) = &patch.title {
                node.title = v.clone();
                changed_fields.push("title".into());
            }
            if let Some(v) = &patch.labels {
                node.labels = v.clone();
                changed_fields.push("labels".into());
            }
            if let Some(v) = &patch.details {
                node.details = v.clone();
                changed_fields.push("details".into());
            }
            if let Some(v) = patch.locked {
                node.locked = v;
                changed_fields.push("locked".into());
            }
            if let Some(v) = &patch.booking_ref {
                node.booking_ref = Some(v.clone());
                changed_fields.push("booking_ref".into());
            }
            if let Some(v) = &patch.tips {
                node.tips = v.clone();
                changed_fields.push("tips".into());
            }
            if let Some(v) = &patch.timing {
                node.timing = v.clone();
                changed_fields.push("timing".into());
            }
            node.updated_by = author;
            node.updated_at = now_ms;
            if !changed_fields.is_empty() {
                diff.updated.push(UpdatedNode { node_ref: NodeRef { node_id: id.clone(), day: day_number }, changed_fields });
            }
        }
        ChangeOperation::Replace { id, node: replacement } => {
            let day_idx = day_index_of(itinerary, id)
                .ok_or_else(|| EngineError::validation(format!("replace: no node with id \"{id}\"")))?;
            let day = &mut itinerary.days[day_idx];
            let day_number = day.day_number;
            let pos = day.node_index(id).expect("located above");
            let mut new_node = replacement.clone();
            new_node.id = id.clone();
            new_node.updated_by = author;
            new_node.updated_at = now_ms;
            day.nodes[pos] = new_node;
            diff.updated.push(UpdatedNode {
                node_ref: NodeRef { node_id: id.clone(), day: day_number },
                changed_fields: vec!["*".into()],
            });
        }
        ChangeOperation::UpdateEdge { .. } => unreachable!("edges are applied in the second pass"),
    }
    Ok(())
}

fn apply_edge_op(itinerary: &mut Itinerary, op: &ChangeOperation, prefs: &ChangePreferences, diff: &mut Diff) -> EngineResult<()> {
    let ChangeOperation::UpdateEdge { from, to, duration_min, mode } = op else {
        return Ok(());
    };
    let Some(day_idx) = day_index_of(itinerary, from) else {
        return Err(EngineError::validation(format!("update_edge: no node with id \"{from}\"")));
    };
    if prefs.respect_locks {
        let day = &itinerary.days[day_idx];
        let locked = day.find_node(from).map(|n| n.locked).unwrap_or(false)
            || day.find_node(to).map(|n| n.locked).unwrap_or(false);
        if locked {
            diff.warnings.push(format!("update_edge {from}->{to} skipped: endpoint is locked"));
            return Ok(());
        }
    }

    let day = &mut itinerary.days[day_idx];
    let day_number = day.day_number;
    if let Some(edge) = day.edges.iter_mut().find(|e| &e.from == from && &e.to == to) {
        if let Some(d) = duration_min {
            edge.transit_info.duration_min = Some(*d);
        }
        if let Some(m) = mode {
            edge.transit_info.mode = Some(m.clone());
        }
    } else {
        diff.warnings.push(format!("update_edge: no edge {from}->{to} in day {day_number}, treated as no-op"));
    }
    Ok(())
}

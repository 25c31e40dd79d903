// ── Enrichment Agent ─────────────────────────────────────────────────────
// Runs over a completed itinerary and emits `update` / `update_edge` ops
// (spec.md §4.5 "Enrichment Agent"). Never changes `status`, and respects
// locks like any other agent-authored ChangeSet.

use async_trait::async_trait;
use chrono::{TimeZone, Timelike, Utc};

use crate::atoms::constants::{KM_PER_DEGREE, STRAIGHT_LINE_SPEED_KMH};
use crate::atoms::error::{EngineError, EngineResult};
use crate::bus::AgentEventStatus;
use crate::model::{Author, ChangeOperation, ChangePreferences, ChangeScope, ChangeSet, Node, NodeType};

use super::{publish_progress, Agent, AgentContext, AgentKind, AgentOutcome};

pub struct EnrichmentAgent;

#[async_trait]
impl Agent for EnrichmentAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Enrichment
    }

    async fn run(&self, ctx: AgentContext) -> EngineResult<AgentOutcome> {
        publish_progress(&ctx.bus, self.kind(), &ctx.run_id, &ctx.itinerary_id, AgentEventStatus::Running, 0, Some("scan"), None);

        let Some(itinerary) = ctx.engine.peek(&ctx.itinerary_id)? else {
            return Err(EngineError::not_found(format!("itinerary \"{}\" not found", ctx.itinerary_id)));
        };

        let mut ops = Vec::new();
        for day in &itinerary.days {
            for node in &day.nodes {
                if let Some(patch) = early_meal_warning(node) {
                    ops.push(patch);
                }
                if let Some(patch) = travel_gap_note(day, node) {
                    ops.push(patch);
                }
            }
            for edge in &day.edges {
                if edge.transit_info.duration_min.is_some() {
                    continue;
                }
                let Some(from_node) = day.find_node(&edge.from) else { continue };
                let Some(to_node) = day.find_node(&edge.to) else { continue };
                if let Some(minutes) = straight_line_minutes(from_node, to_node) {
                    ops.push(ChangeOperation::UpdateEdge {
                        from: edge.from.clone(),
                        to: edge.to.clone(),
                        duration_min: Some(minutes),
                        mode: None,
                    });
                }
            }
        }

        if ops.is_empty() {
            publish_progress(&ctx.bus, self.kind(), &ctx.run_id, &ctx.itinerary_id, AgentEventStatus::Succeeded, 100, Some("done"), Some("nothing to enrich"));
            return Ok(AgentOutcome { change_set: None, applied: false, to_version: None, diff: None, message: "nothing to enrich".to_string(), warnings: vec![] });
        }

        let change_set = ChangeSet {
            scope: ChangeScope::Trip,
            day: None,
            ops,
            preferences: ChangePreferences::default(),
            author: Author::Agent,
        };

        publish_progress(&ctx.bus, self.kind(), &ctx.run_id, &ctx.itinerary_id, AgentEventStatus::Running, 60, Some("apply"), None);
        let result = ctx.engine.apply(&ctx.itinerary_id, &change_set).await?;

        publish_progress(
            &ctx.bus,
            self.kind(),
            &ctx.run_id,
            &ctx.itinerary_id,
            AgentEventStatus::Succeeded,
            100,
            Some("done"),
            Some(&format!("enriched {} node(s)/edge(s)", change_set.ops.len())),
        );

        Ok(AgentOutcome {
            change_set: Some(change_set),
            applied: true,
            to_version: Some(result.to_version),
            diff: Some(result.diff.clone()),
            message: "Enrichment applied".to_string(),
            warnings: result.diff.warnings,
        })
    }
}

/// Flags early-morning meals that may precede opening hours.
fn early_meal_warning(node: &Node) -> Option<ChangeOperation> {
    if node.node_type != NodeType::Meal {
        return None;
    }
    let start = node.timing.start_time?;
    let hour = Utc.timestamp_millis_opt(start).single()?.hour();
    if hour >= 7 {
        return None;
    }
    if node.tips.warnings.iter().any(|w| w.contains("may not be open")) {
        return None;
    }
    let mut patch = crate::model::NodePatch::default();
    let mut tips = node.tips.clone();
    tips.warnings.push("restaurant may not be open this early".to_string());
    patch.tips = Some(tips);
    Some(ChangeOperation::Update { id: node.id.clone(), patch })
}

/// Annotates a node whose gap from the previous node in the day is tight.
fn travel_gap_note(day: &crate::model::Day, node: &Node) -> Option<ChangeOperation> {
    let idx = day.node_index(&node.id)?;
    if idx == 0 {
        return None;
    }
    let prev = &day.nodes[idx - 1];
    let gap_minutes = match (prev.timing.end_time, node.timing.start_time) {
        (Some(end), Some(start)) if start > end => (start - end) / 60_000,
        _ => return None,
    };
    if gap_minutes >= 20 {
        return None;
    }
    let note = format!("only {gap_minutes} minutes between activities");
    if node.tips.travel.contains(&note) {
        return None;
    }
    let mut patch = crate::model::NodePatch::default();
    let mut tips = node.tips.clone();
    tips.travel.push(note);
    patch.tips = Some(tips);
    Some(ChangeOperation::Update { id: node.id.clone(), patch })
}

/// Straight-line distance (degrees × km/degree) at an assumed speed, used
/// only when no provider transit estimate exists (spec.md §4.5).
fn straight_line_minutes(from: &Node, to: &Node) -> Option<f64> {
    let (lat1, lng1) = (from.location.lat?, from.location.lng?);
    let (lat2, lng2) = (to.location.lat?, to.location.lng?);
    let dx = lat2 - lat1;
    let dy = lng2 - lng1;
    let distance_km = (dx * dx + dy * dy).sqrt() * KM_PER_DEGREE;
    Some((distance_km / STRAIGHT_LINE_SPEED_KMH) * 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cost, Details, Links, Location, NodeStatus, Tips, Timing};

    fn node(id: &str, node_type: NodeType) -> Node {
        Node {
            id: id.into(),
            node_type,
            title: "Node".into(),
            location: Location::default(),
            timing: Timing::default(),
            cost: Cost::default(),
            details: Details::default(),
            labels: vec![],
            tips: Tips::default(),
            links: Links::default(),
            locked: false,
            booking_ref: None,
            status: NodeStatus::Planned,
            updated_by: Author::User,
            updated_at: 0,
        }
    }

    #[test]
    fn flags_meal_before_seven_am() {
        let mut n = node("n1", NodeType::Meal);
        n.timing.start_time = Some(Utc.with_ymd_and_hms(2025, 10, 4, 6, 0, 0).unwrap().timestamp_millis());
        assert!(early_meal_warning(&n).is_some());
    }

    #[test]
    fn does_not_flag_meal_after_seven_am() {
        let mut n = node("n1", NodeType::Meal);
        n.timing.start_time = Some(Utc.with_ymd_and_hms(2025, 10, 4, 9, 0, 0).unwrap().timestamp_millis());
        assert!(early_meal_warning(&n).is_none());
    }

    #[test]
    fn estimates_straight_line_minutes_between_coordinates() {
        let mut a = node("a", NodeType::Attraction);
        a.location.lat = Some(41.0);
        a.location.lng = Some(2.0);
        let mut b = node("b", NodeType::Attraction);
        b.location.lat = Some(41.1);
        b.location.lng = Some(2.0);
        let minutes = straight_line_minutes(&a, &b).unwrap();
        assert!(minutes > 0.0);
    }

    #[test]
    fn missing_coordinates_yields_no_estimate() {
        let a = node("a", NodeType::Attraction);
        let b = node("b", NodeType::Attraction);
        assert!(straight_line_minutes(&a, &b).is_none());
    }
}

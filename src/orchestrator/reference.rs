// ── Orchestrator: reference resolution ─────────────────────────────────────
// Fuzzy-matches a chat request's free text against node titles in the
// current itinerary (spec.md §4.6 step 2). No external NLP dependency —
// a normalized substring/token-overlap score, in the same spirit as the
// teacher resolving channel/agent references by plain string matching.

use serde::{Deserialize, Serialize};

use crate::atoms::constants::{REFERENCE_DISAMBIGUATION_TOLERANCE, REFERENCE_MATCH_THRESHOLD};
use crate::model::{Itinerary, Location, NodeType};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeCandidate {
    pub id: String,
    pub title: String,
    pub day: u32,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub location: Location,
    pub confidence: f64,
}

/// Score `title` against `query` as the fraction of the query's
/// whitespace-separated tokens found as a substring of the title
/// (case-insensitive), plus a bonus for an exact substring match of the
/// whole query.
fn score(query: &str, title: &str) -> f64 {
    let query = query.to_lowercase();
    let title_lower = title.to_lowercase();
    if query.trim().is_empty() {
        return 0.0;
    }
    if title_lower.contains(&query) {
        return 1.0;
    }
    let tokens: Vec<&str> = query.split_whitespace().filter(|t| t.len() > 2).collect();
    if tokens.is_empty() {
        return 0.0;
    }
    let matches = tokens.iter().filter(|t| title_lower.contains(**t)).count();
    matches as f64 / tokens.len() as f64
}

/// Resolve candidates for `query` against every node in `itinerary`,
/// optionally narrowed to `day_hint`. `selected_node_id`, when present and
/// valid, always wins outright (confidence 1.0, sole candidate).
pub fn resolve(itinerary: &Itinerary, query: &str, day_hint: Option<u32>, selected_node_id: Option<&str>) -> Vec<NodeCandidate> {
    if let Some(id) = selected_node_id {
        if let Some((node, _)) = itinerary.find_node(id) {
            let day_number = itinerary.days.iter().find(|d| d.find_node(id).is_some()).map(|d| d.day_number).unwrap_or(0);
            return vec![NodeCandidate {
                id: node.id.clone(),
                title: node.title.clone(),
                day: day_number,
                node_type: node.node_type.clone(),
                location: node.location.clone(),
                confidence: 1.0,
            }];
        }
    }

    let mut candidates: Vec<NodeCandidate> = itinerary
        .days
        .iter()
        .filter(|d| day_hint.map_or(true, |h| h == d.day_number))
        .flat_map(|day| {
            day.nodes.iter().map(move |node| NodeCandidate {
                id: node.id.clone(),
                title: node.title.clone(),
                day: day.day_number,
                node_type: node.node_type.clone(),
                location: node.location.clone(),
                confidence: score(query, &node.title),
            })
        })
        .filter(|c| c.confidence >= REFERENCE_MATCH_THRESHOLD)
        .collect();

    candidates.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));
    candidates
}

/// True when two or more candidates score within tolerance of each other,
/// both above threshold — the Disambiguation response case (spec.md §4.6).
pub fn needs_disambiguation(candidates: &[NodeCandidate]) -> bool {
    if candidates.len() < 2 {
        return false;
    }
    (candidates[0].confidence - candidates[1].confidence).abs() <= REFERENCE_DISAMBIGUATION_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Author, Cost, Day, Details, Links, Node, NodeStatus, Tips, Timing};

    fn node(id: &str, title: &str) -> Node {
        Node {
            id: id.into(),
            node_type: NodeType::Attraction,
            title: title.into(),
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

    fn itinerary_with(nodes: Vec<Node>) -> Itinerary {
        let mut it = Itinerary::new("trip-1", "anonymous", 0);
        it.days.push(Day { day_number: 1, date: "2025-10-04".into(), location: "".into(), nodes, edges: vec![], pacing: None, time_window: None, totals: None, warnings: vec![] });
        it
    }

    #[test]
    fn exact_substring_match_scores_highest() {
        let it = itinerary_with(vec![node("n1", "Sagrada Familia"), node("n2", "Park Guell")]);
        let candidates = resolve(&it, "sagrada familia", None, None);
        assert_eq!(candidates[0].id, "n1");
        assert_eq!(candidates[0].confidence, 1.0);
    }

    #[test]
    fn selected_node_id_wins_outright() {
        let it = itinerary_with(vec![node("n1", "Sagrada Familia"), node("n2", "Park Guell")]);
        let candidates = resolve(&it, "anything", None, Some("n2"));
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "n2");
    }

    #[test]
    fn ambiguous_candidates_trigger_disambiguation() {
        let it = itinerary_with(vec![node("n1", "Park Guell"), node("n2", "Park Central")]);
        let candidates = resolve(&it, "park", None, None);
        assert!(needs_disambiguation(&candidates));
    }

    #[test]
    fn below_threshold_candidates_are_excluded() {
        let it = itinerary_with(vec![node("n1", "Sagrada Familia")]);
        let candidates = resolve(&it, "completely unrelated text", None, None);
        assert!(candidates.is_empty());
    }
}

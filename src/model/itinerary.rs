// ── Document Model: Itinerary (root entity) ────────────────────────────────

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::day::Day;
use super::node::Node;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItineraryStatus {
    Planning,
    Generating,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeScope {
    Trip,
    Day,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItinerarySettings {
    #[serde(default)]
    pub auto_apply: bool,
    #[serde(default = "default_scope")]
    pub default_scope: ChangeScope,
    #[serde(default = "super::default_true")]
    pub respect_locks: bool,
}

fn default_scope() -> ChangeScope {
    ChangeScope::Trip
}

impl Default for ItinerarySettings {
    fn default() -> Self {
        Self { auto_apply: false, default_scope: ChangeScope::Trip, respect_locks: true }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentRunStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Itinerary {
    pub itinerary_id: String,
    pub version: u64,
    pub owner_id: String,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub days: Vec<Day>,
    #[serde(default)]
    pub settings: ItinerarySettings,
    #[serde(default)]
    pub agents: HashMap<String, AgentRunStatus>,
    pub status: ItineraryStatus,
}

impl Itinerary {
    pub fn new(itinerary_id: impl Into<String>, owner_id: impl Into<String>, now_ms: i64) -> Self {
        Self {
            itinerary_id: itinerary_id.into(),
            version: 1,
            owner_id: owner_id.into(),
            created_at: now_ms,
            updated_at: now_ms,
            summary: String::new(),
            currency: String::new(),
            themes: Vec::new(),
            days: Vec::new(),
            settings: ItinerarySettings::default(),
            agents: HashMap::new(),
            status: ItineraryStatus::Planning,
        }
    }

    /// Find a node by id anywhere in the document, returning the node and
    /// the 0-based index of the day it lives in.
    pub fn find_node(&self, id: &str) -> Option<(&Node, usize)> {
        self.days
            .iter()
            .enumerate()
            .find_map(|(idx, day)| day.find_node(id).map(|n| (n, idx)))
    }

    pub fn find_node_mut(&mut self, id: &str) -> Option<(&mut Node, usize)> {
        for (idx, day) in self.days.iter_mut().enumerate() {
            if day.find_node(id).is_some() {
                return day.find_node_mut(id).map(|n| (n, idx));
            }
        }
        None
    }

    pub fn day_mut(&mut self, day_number: u32) -> Option<&mut Day> {
        self.days.iter_mut().find(|d| d.day_number == day_number)
    }

    pub fn day(&self, day_number: u32) -> Option<&Day> {
        self.days.iter().find(|d| d.day_number == day_number)
    }

    /// P4: node ids are unique across the whole itinerary.
    pub fn node_ids_unique(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.days
            .iter()
            .flat_map(|d| d.nodes.iter())
            .all(|n| seen.insert(n.id.clone()))
    }

    /// Day numbers are unique and 1-based contiguous.
    pub fn day_numbers_contiguous(&self) -> bool {
        let mut numbers: Vec<u32> = self.days.iter().map(|d| d.day_number).collect();
        numbers.sort_unstable();
        numbers.iter().enumerate().all(|(i, &n)| n == (i as u32) + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::{Author, Location, NodeStatus, NodeType, Timing};

    fn sample_node(id: &str) -> Node {
        Node {
            id: id.into(),
            node_type: NodeType::Attraction,
            title: "Sample".into(),
            location: Location::default(),
            timing: Timing::default(),
            cost: Default::default(),
            details: Default::default(),
            labels: vec![],
            tips: Default::default(),
            links: Default::default(),
            locked: false,
            booking_ref: None,
            status: NodeStatus::Planned,
            updated_by: Author::User,
            updated_at: 0,
        }
    }

    #[test]
    fn finds_node_and_day_index() {
        let mut it = Itinerary::new("trip-1", "anonymous", 0);
        it.days.push(Day {
            day_number: 1,
            date: "2025-10-04".into(),
            location: "Barcelona".into(),
            nodes: vec![sample_node("n1")],
            edges: vec![],
            pacing: None,
            time_window: None,
            totals: None,
            warnings: vec![],
        });
        let (node, day_idx) = it.find_node("n1").unwrap();
        assert_eq!(node.id, "n1");
        assert_eq!(day_idx, 0);
    }

    #[test]
    fn detects_duplicate_node_ids() {
        let mut it = Itinerary::new("trip-1", "anonymous", 0);
        it.days.push(Day {
            day_number: 1,
            date: "2025-10-04".into(),
            location: "Barcelona".into(),
            nodes: vec![sample_node("dup"), sample_node("dup")],
            edges: vec![],
            pacing: None,
            time_window: None,
            totals: None,
            warnings: vec![],
        });
        assert!(!it.node_ids_unique());
    }

    #[test]
    fn day_numbers_must_be_contiguous() {
        let mut it = Itinerary::new("trip-1", "anonymous", 0);
        it.days.push(Day {
            day_number: 2,
            date: "2025-10-05".into(),
            location: "Barcelona".into(),
            nodes: vec![],
            edges: vec![],
            pacing: None,
            time_window: None,
            totals: None,
            warnings: vec![],
        });
        assert!(!it.day_numbers_contiguous());
    }
}

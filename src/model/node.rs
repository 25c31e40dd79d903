// ── Document Model: Node ───────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Attraction,
    Meal,
    Accommodation,
    Transport,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Planned,
    InProgress,
    Completed,
    Skipped,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Author {
    User,
    Agent,
    System,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Timing {
    /// Epoch millis. Normalized on ingest from `"HH:MM"` + `Day.date` by
    /// `model::time::normalize_timing` — consumers may assume epoch-ms
    /// everywhere past that boundary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Cost {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_unit: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Details {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Arbitrary provider-specific sub-fields the model does not interpret.
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Tips {
    #[serde(default)]
    pub best_time: Vec<String>,
    #[serde(default)]
    pub travel: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Links {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub title: String,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub timing: Timing,
    #[serde(default)]
    pub cost: Cost,
    #[serde(default)]
    pub details: Details,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub tips: Tips,
    #[serde(default)]
    pub links: Links,
    #[serde(default)]
    pub locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_ref: Option<String>,
    pub status: NodeStatus,
    pub updated_by: Author,
    pub updated_at: i64,
}

impl Node {
    /// Whether this node has been through the booking flow. Booking sets
    /// `booking_ref` and the "Booked" label but never flips `locked` —
    /// locking stays an explicit user choice (spec.md §3.5, §9).
    pub fn is_booked(&self) -> bool {
        self.booking_ref.is_some()
    }

    /// The restricted status transition graph from spec.md §3.3. All other
    /// transitions (including a no-op self-transition) are rejected.
    pub fn can_transition_to(&self, target: &NodeStatus) -> bool {
        use NodeStatus::*;
        matches!(
            (&self.status, target),
            (Planned, InProgress)
                | (Planned, Skipped)
                | (Planned, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Skipped)
                | (InProgress, Cancelled)
                | (Completed, Planned)
                | (Completed, InProgress)
                | (Skipped, Planned)
                | (Skipped, InProgress)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(status: NodeStatus) -> Node {
        Node {
            id: "n1".into(),
            node_type: NodeType::Attraction,
            title: "Park".into(),
            location: Location::default(),
            timing: Timing::default(),
            cost: Cost::default(),
            details: Details::default(),
            labels: vec![],
            tips: Tips::default(),
            links: Links::default(),
            locked: false,
            booking_ref: None,
            status,
            updated_by: Author::User,
            updated_at: 0,
        }
    }

    #[test]
    fn allowed_transitions_hold() {
        assert!(node(NodeStatus::Planned).can_transition_to(&NodeStatus::InProgress));
        assert!(node(NodeStatus::InProgress).can_transition_to(&NodeStatus::Completed));
        assert!(node(NodeStatus::Completed).can_transition_to(&NodeStatus::Planned));
        assert!(node(NodeStatus::Skipped).can_transition_to(&NodeStatus::InProgress));
    }

    #[test]
    fn disallowed_transitions_rejected() {
        assert!(!node(NodeStatus::Planned).can_transition_to(&NodeStatus::Completed));
        assert!(!node(NodeStatus::Cancelled).can_transition_to(&NodeStatus::Planned));
        assert!(!node(NodeStatus::Completed).can_transition_to(&NodeStatus::Cancelled));
    }

    #[test]
    fn booking_does_not_imply_lock() {
        let mut n = node(NodeStatus::Planned);
        n.booking_ref = Some("BK123".into());
        assert!(n.is_booked());
        assert!(!n.locked);
    }
}

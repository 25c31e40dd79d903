// ── Document Model: ChangeSet & ChangeOperation ────────────────────────────

use serde::{Deserialize, Serialize};

use super::itinerary::ChangeScope;
use super::node::Node;
use super::time::TimingInput;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ChangeOperation {
    Insert {
        after: String,
        node: Node,
    },
    Delete {
        id: String,
    },
    Move {
        id: String,
        /// Epoch millis or a short clock/instant string, resolved against
        /// the target day's `date` at apply time (spec.md §4.1).
        #[serde(skip_serializing_if = "Option::is_none")]
        start_time: Option<TimingInput>,
        #[serde(skip_serializing_if = "Option::is_none")]
        end_time: Option<TimingInput>,
        #[serde(skip_serializing_if = "Option::is_none")]
        after: Option<String>,
    },
    Update {
        id: String,
        patch: NodePatch,
    },
    Replace {
        id: String,
        node: Node,
    },
    UpdateEdge {
        from: String,
        to: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_min: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        mode: Option<String>,
    },
}

impl ChangeOperation {
    /// Ops that mutate or remove an existing node — subject to the
    /// respect-locks gate (spec.md §4.3).
    pub fn is_destructive_or_mutating(&self) -> bool {
        matches!(
            self,
            ChangeOperation::Delete { .. }
                | ChangeOperation::Move { .. }
                | ChangeOperation::Update { .. }
                | ChangeOperation::Replace { .. }
        )
    }

    /// The node id this op targets, if any (edges and inserts have no
    /// single pre-existing target).
    pub fn target_id(&self) -> Option<&str> {
        match self {
            ChangeOperation::Delete { id }
            | ChangeOperation::Move { id, .. }
            | ChangeOperation::Update { id, .. }
            | ChangeOperation::Replace { id, .. } => Some(id),
            ChangeOperation::Insert { .. } | ChangeOperation::UpdateEdge { .. } => None,
        }
    }
}

/// A partial patch to an existing node. All fields optional; only present
/// fields are applied. Mirrors the subset of `Node` fields spec.md §3.4
/// names as patchable via `update`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NodePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<super::node::Details>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<super::node::NodeStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tips: Option<super::node::Tips>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<super::node::Timing>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangePreferences {
    #[serde(default = "super::default_true")]
    pub user_first: bool,
    #[serde(default)]
    pub auto_apply: bool,
    #[serde(default = "super::default_true")]
    pub respect_locks: bool,
}

impl Default for ChangePreferences {
    fn default() -> Self {
        Self { user_first: true, auto_apply: false, respect_locks: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeSet {
    pub scope: ChangeScope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    #[serde(default)]
    pub ops: Vec<ChangeOperation>,
    #[serde(default)]
    pub preferences: ChangePreferences,
    /// Who authored this ChangeSet as a whole — used for `updatedBy`
    /// stamping and the revision's `author` field when ops don't carry
    /// their own per-op authorship.
    #[serde(default = "default_author")]
    pub author: super::node::Author,
}

fn default_author() -> super::node::Author {
    super::node::Author::User
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

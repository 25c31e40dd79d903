// ── Document Model: Diff & Revision ────────────────────────────────────────

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub node_id: String,
    pub day: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdatedNode {
    pub node_ref: NodeRef,
    pub changed_fields: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Diff {
    #[serde(default)]
    pub added: Vec<NodeRef>,
    #[serde(default)]
    pub removed: Vec<NodeRef>,
    #[serde(default)]
    pub updated: Vec<UpdatedNode>,
    pub to_version: u64,
    /// Node ids whose destructive/mutating op was dropped by the
    /// respect-locks gate (spec.md §4.3, §7). Informational only — never
    /// aborts the rest of the `ChangeSet`.
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl Diff {
    pub fn empty(to_version: u64) -> Self {
        Self { to_version, ..Default::default() }
    }

    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

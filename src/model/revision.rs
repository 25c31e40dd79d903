// ── Document Model: Revision (append-only history) ─────────────────────────

use serde::{Deserialize, Serialize};

use super::diff::Diff;
use super::itinerary::Itinerary;
use super::node::Author;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Revision {
    pub itinerary_id: String,
    pub version: u64,
    pub timestamp: i64,
    pub description: String,
    pub author: Author,
    pub diff: Diff,
    /// Full document snapshot at this version — the basis for `undo`
    /// (spec.md §3.6).
    pub snapshot: Itinerary,
}

// ── Document Model (C1) ────────────────────────────────────────────────────
// Normalized itinerary schema, node/edge/day structure, status & lock bits.
// No I/O, no side effects — invariants enforced at construction and at
// deserialization boundaries (see `validate`).

pub mod change_set;
pub mod day;
pub mod diff;
pub mod itinerary;
pub mod node;
pub mod revision;
pub mod time;
pub mod validate;

pub use change_set::{ChangeOperation, ChangePreferences, ChangeSet, NodePatch};
pub use day::{Day, Edge, Pacing, TimeWindow, Totals, TransitInfo};
pub use diff::{Diff, NodeRef, UpdatedNode};
pub use itinerary::{AgentRunStatus, ChangeScope, Itinerary, ItinerarySettings, ItineraryStatus};
pub use node::{Author, Cost, Details, Links, Location, Node, NodeStatus, NodeType, Timing, Tips};
pub use revision::Revision;
pub use time::TimingInput;

pub(crate) fn default_true() -> bool {
    true
}

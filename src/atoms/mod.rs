// ── Itinerary Engine Atoms ─────────────────────────────────────────────────
// Pure constants and error types — zero side effects, no I/O.
// Dependency rule: atoms may only depend on std and external pure crates.
// Nothing here may import from model/, store/, engine/, ai/, agents/,
// orchestrator/, or bus/.

pub mod constants;
pub mod error;

// ── Itinerary Engine Atoms: Constants ──────────────────────────────────────

/// Maximum length of a chat request's free-text field (spec.md §4.6).
pub const MAX_CHAT_TEXT_LEN: usize = 1000;

/// Default `preferences.respectLocks` for an applied `ChangeSet`.
pub const DEFAULT_RESPECT_LOCKS: bool = true;

/// Default `preferences.userFirst` tie-break (agent op yields to user op).
pub const DEFAULT_USER_FIRST: bool = true;

/// Fuzzy-match confidence threshold above which a node title candidate is
/// considered for chat reference resolution.
pub const REFERENCE_MATCH_THRESHOLD: f64 = 0.55;

/// Disambiguation kicks in when two or more candidates score within this
/// tolerance of each other, both above the threshold.
pub const REFERENCE_DISAMBIGUATION_TOLERANCE: f64 = 0.12;

/// Assumed straight-line travel speed (km/h) used by the Enrichment Agent
/// when no transit provider estimate is available.
pub const STRAIGHT_LINE_SPEED_KMH: f64 = 40.0;

/// Degrees-to-kilometers constant used for the straight-line transit
/// estimate (spec.md §4.5).
pub const KM_PER_DEGREE: f64 = 111.0;

/// Default per-call AI provider timeout in milliseconds.
pub const DEFAULT_AI_TIMEOUT_MS: u64 = 30_000;

/// Circuit breaker: consecutive provider failures before tripping open.
pub const CIRCUIT_BREAKER_THRESHOLD: u32 = 5;

/// Circuit breaker: cooldown period in seconds while open.
pub const CIRCUIT_BREAKER_COOLDOWN_SECS: u64 = 60;

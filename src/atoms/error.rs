// ── Itinerary Engine Atoms: Error Types ────────────────────────────────────
// Single canonical error enum for the engine, built with `thiserror`.
//
// Design rules:
//   • Variants are coarse-grained by domain (I/O, DB, Provider, Validation…).
//   • The `#[from]` attribute wires std/external error conversions automatically.
//   • `EngineError` → `String` conversion is provided so that API-boundary
//     handlers (`Result<T, String>` style JSON error envelopes) can call
//     `.map_err(|e| e.to_string())` without boilerplate.
//   • No variant carries secret material (API keys, tokens) in its message.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed request: unknown op verb, missing `after`, illegal status
    /// transition, lat/lng out of range, etc.
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown itinerary, node, or revision.
    #[error("not found: {0}")]
    NotFound(String),

    /// Reserved for future multi-master; never raised by a single-writer
    /// per-itinerary lock today.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Missing or rejected credentials. Raised at the API boundary, never
    /// by the core engine.
    #[error("auth error: {0}")]
    Auth(String),

    /// The AI provider chain was exhausted, or structured output failed
    /// schema validation after every provider was tried.
    #[error("agent failure: {0}")]
    AgentFailure(String),

    /// A single provider call failed in a way the chain should retry or
    /// fall over from. Callers should not normally observe this variant —
    /// it is absorbed internally into `AgentFailure` or a successful
    /// fallback.
    #[error("provider error: {provider}: {message}")]
    Provider { provider: String, message: String },

    /// Informational: an op was dropped under `respectLocks=true`. Carried
    /// in a diff's warnings, never aborts a `ChangeSet`.
    #[error("lock rejection: node {0} is locked")]
    LockRejection(String),

    /// Filesystem or OS-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// SQLite / rusqlite database failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// HTTP / network failure (reqwest layer).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Catch-all for errors that do not yet have a dedicated variant.
    /// Prefer adding a specific variant over using this in new code.
    #[error("{0}")]
    Other(String),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider { provider: provider.into(), message: message.into() }
    }

    /// True for the error kinds spec.md §7 classifies as aborting the whole
    /// `apply` (as opposed to `LockRejection`, which is per-op and
    /// accumulated in the diff's warnings).
    pub fn aborts_apply(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_))
    }
}

impl From<String> for EngineError {
    fn from(s: String) -> Self {
        EngineError::Other(s)
    }
}

impl From<&str> for EngineError {
    fn from(s: &str) -> Self {
        EngineError::Other(s.to_string())
    }
}

impl From<EngineError> for String {
    fn from(e: EngineError) -> Self {
        e.to_string()
    }
}

/// All engine operations should return this type.
pub type EngineResult<T> = Result<T, EngineError>;

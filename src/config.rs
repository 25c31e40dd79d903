// ── Configuration ───────────────────────────────────────────────────────────
// Loaded once from the environment at process startup and passed down by
// construction (`Engine::new`, `Orchestrator::new`) rather than read ad hoc
// from call sites — the teacher's own core engine layer keeps runtime
// settings in its SQLite `engine_config` table and reads only bootstrap
// secrets from the environment; this crate has no config-file parser either,
// matching that choice (SPEC_FULL.md §6.4).

use std::env;
use std::time::Duration;

use crate::atoms::constants::DEFAULT_AI_TIMEOUT_MS;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// SQLite database file path. Defaults to `itinerary.db` in the cwd.
    pub database_path: String,
    /// Primary AI provider: one of `openrouter`, `gemini`, `noop`.
    pub ai_provider: String,
    pub openrouter_api_key: Option<String>,
    pub openrouter_model: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub ai_timeout: Duration,
    pub http_bind_addr: String,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self {
            database_path: env::var("ITINERARY_DB_PATH").unwrap_or_else(|_| "itinerary.db".to_string()),
            ai_provider: env::var("ITINERARY_AI_PROVIDER").unwrap_or_else(|_| "openrouter".to_string()),
            openrouter_api_key: env::var("OPENROUTER_API_KEY").ok(),
            openrouter_model: env::var("OPENROUTER_MODEL").unwrap_or_else(|_| "openrouter/auto".to_string()),
            gemini_api_key: env::var("GEMINI_API_KEY").ok(),
            gemini_model: env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
            ai_timeout: env::var("ITINERARY_AI_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or_else(|| Duration::from_millis(DEFAULT_AI_TIMEOUT_MS)),
            http_bind_addr: env::var("ITINERARY_HTTP_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

// ── AI Client Abstraction (C4) ───────────────────────────────────────────────
// A provider chain built at startup from a single `ai.provider` setting:
// the configured provider goes first, the remaining recognized kinds follow
// as ordered fallbacks, and `noop` is always appended last as the safety
// net (spec.md §4.4). `generate_structured` walks the chain, treating
// network error / non-2xx / fence-stripped-JSON-still-invalid / timeout as
// "failed, try next".

mod fence;
mod http;
pub mod providers;

pub use fence::strip_fences;
pub use providers::AiProvider;

use log::warn;

use crate::atoms::error::{EngineError, EngineResult};
use crate::config::EngineConfig;

const RECOGNIZED_KINDS: &[&str] = &["openrouter", "gemini", "noop"];

pub struct ProviderChain {
    providers: Vec<Box<dyn AiProvider>>,
}

impl ProviderChain {
    /// `primary` goes first; every other recognized kind that can actually
    /// be constructed (has credentials) follows, and `noop` is always
    /// appended last even if already present, so the chain never empties
    /// out.
    pub fn from_config(config: &EngineConfig) -> Self {
        let mut order: Vec<&str> = vec![config.ai_provider.as_str()];
        order.extend(RECOGNIZED_KINDS.iter().filter(|k| **k != config.ai_provider));

        let mut providers = Vec::new();
        for kind in order {
            if kind == "noop" {
                continue;
            }
            if let Some(p) = providers::build_provider(kind, config) {
                providers.push(p);
            }
        }
        providers.push(providers::build_provider("noop", config).expect("noop always constructs"));

        Self { providers }
    }

    /// Attempt providers in order, returning the first success, after
    /// stripping markdown fences from the raw response (spec.md §4.4).
    /// Because `noop` is always last and never fails, this only returns
    /// `Err` if every configured real provider's chain AND `noop` fail,
    /// which cannot happen — callers may treat the `Ok` path as guaranteed
    /// while still propagating the type for future providers that could.
    pub async fn generate_structured(&self, system: &str, user: &str, schema_hint: &str) -> EngineResult<String> {
        let mut last_err: Option<EngineError> = None;
        for provider in &self.providers {
            match provider.generate_structured(system, user, schema_hint).await {
                Ok(raw) => return Ok(strip_fences(&raw)),
                Err(e) => {
                    warn!("[ai] provider \"{}\" failed, falling through: {e}", provider.name());
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| EngineError::AgentFailure("provider chain exhausted".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_only_chain_always_succeeds() {
        let config = EngineConfig { ai_provider: "noop".to_string(), ..EngineConfig::from_env() };
        let chain = ProviderChain::from_config(&config);
        let out = chain.generate_structured("sys", "user", "itinerary schema").await.unwrap();
        assert!(out.contains("\"days\""));
    }

    #[tokio::test]
    async fn missing_credentials_falls_back_to_noop() {
        let mut config = EngineConfig { ai_provider: "openrouter".to_string(), ..EngineConfig::from_env() };
        config.openrouter_api_key = None;
        let chain = ProviderChain::from_config(&config);
        // openrouter cannot be constructed without a key, so the chain is
        // just [noop] and still succeeds.
        let out = chain.generate_structured("sys", "user", "itinerary schema").await.unwrap();
        assert!(out.contains("\"days\""));
    }
}

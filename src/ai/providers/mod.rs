// ── AI Client: provider trait & factory ─────────────────────────────────────
// Type-erased `Box<dyn AiProvider>`, matching the teacher's `AnyProvider`
// pattern (`engine/providers/mod.rs`): adding a provider never requires
// touching a central dispatch enum, only implementing the trait and adding
// one factory arm.

pub mod gemini;
pub mod noop;
pub mod openrouter;

pub use gemini::GeminiProvider;
pub use noop::NoopProvider;
pub use openrouter::OpenRouterProvider;

use async_trait::async_trait;

use crate::atoms::error::EngineResult;
use crate::config::EngineConfig;

/// Capability: turn a system/user prompt pair into structured (JSON) text
/// (spec.md §4.4). Implementations own their own HTTP client, retry policy,
/// and circuit breaker.
#[async_trait]
pub trait AiProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn generate_structured(&self, system: &str, user: &str, schema_hint: &str) -> EngineResult<String>;
}

/// Build the provider named `kind` from config, or `None` if it cannot be
/// constructed (e.g. missing API key).
pub fn build_provider(kind: &str, config: &EngineConfig) -> Option<Box<dyn AiProvider>> {
    match kind {
        "openrouter" => config
            .openrouter_api_key
            .clone()
            .map(|key| Box::new(OpenRouterProvider::new(key, config.openrouter_model.clone(), config.ai_timeout)) as Box<dyn AiProvider>),
        "gemini" => config
            .gemini_api_key
            .clone()
            .map(|key| Box::new(GeminiProvider::new(key, config.gemini_model.clone(), config.ai_timeout)) as Box<dyn AiProvider>),
        "noop" => Some(Box::new(NoopProvider)),
        _ => None,
    }
}

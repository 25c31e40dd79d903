// ── AI Client: OpenRouter (OpenAI-compatible chat completions) ─────────────
// Grounded on the teacher's `engine/providers/openai.rs`: a shared
// `reqwest::Client`, the `engine/http.rs` retry/backoff loop, and a
// per-provider `CircuitBreaker`. Non-streaming here — `generate_structured`
// only needs a single completion, not the teacher's SSE chat stream.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use log::warn;
use reqwest::Client;
use serde_json::json;

use crate::atoms::error::{EngineError, EngineResult};

use super::super::http::{is_retryable_status, retry_delay, CircuitBreaker, MAX_RETRIES};
use super::AiProvider;

static OPENROUTER_CIRCUIT: LazyLock<CircuitBreaker> =
    LazyLock::new(|| CircuitBreaker::new(crate::atoms::constants::CIRCUIT_BREAKER_THRESHOLD, crate::atoms::constants::CIRCUIT_BREAKER_COOLDOWN_SECS));

pub struct OpenRouterProvider {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenRouterProvider {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        let client = Client::builder().connect_timeout(Duration::from_secs(10)).timeout(timeout).build().unwrap_or_default();
        Self { client, api_key, model }
    }
}

#[async_trait]
impl AiProvider for OpenRouterProvider {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    async fn generate_structured(&self, system: &str, user: &str, _schema_hint: &str) -> EngineResult<String> {
        OPENROUTER_CIRCUIT.check().map_err(|msg| EngineError::provider("openrouter", msg))?;

        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "response_format": {"type": "json_object"},
        });

        let mut last_err = String::new();
        for attempt in 0..MAX_RETRIES {
            let response = self
                .client
                .post("https://openrouter.ai/api/v1/chat/completions")
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let value: serde_json::Value = resp.json().await.map_err(EngineError::from)?;
                    let text = value["choices"][0]["message"]["content"]
                        .as_str()
                        .ok_or_else(|| EngineError::provider("openrouter", "missing choices[0].message.content"))?
                        .to_string();
                    OPENROUTER_CIRCUIT.record_success();
                    return Ok(text);
                }
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    last_err = format!("HTTP {status}");
                    if !is_retryable_status(status) {
                        OPENROUTER_CIRCUIT.record_failure();
                        return Err(EngineError::provider("openrouter", last_err));
                    }
                }
                Err(e) => {
                    last_err = e.to_string();
                }
            }
            warn!("[ai:openrouter] attempt {attempt} failed: {last_err}, retrying");
            retry_delay(attempt).await;
        }

        OPENROUTER_CIRCUIT.record_failure();
        Err(EngineError::provider("openrouter", format!("exhausted {MAX_RETRIES} retries: {last_err}")))
    }
}

// ── AI Client: Gemini (generateContent REST API) ───────────────────────────
// Same retry/circuit-breaker shape as `openrouter.rs`; the wire format
// differs (`contents[].parts[].text`, API key as a query parameter rather
// than a bearer token) so it gets its own file, matching the teacher's
// file-per-backend layout (`providers/{openai,anthropic,google}.rs`).

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use log::warn;
use reqwest::Client;
use serde_json::json;

use crate::atoms::error::{EngineError, EngineResult};

use super::super::http::{is_retryable_status, retry_delay, CircuitBreaker, MAX_RETRIES};
use super::AiProvider;

static GEMINI_CIRCUIT: LazyLock<CircuitBreaker> =
    LazyLock::new(|| CircuitBreaker::new(crate::atoms::constants::CIRCUIT_BREAKER_THRESHOLD, crate::atoms::constants::CIRCUIT_BREAKER_COOLDOWN_SECS));

pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        let client = Client::builder().connect_timeout(Duration::from_secs(10)).timeout(timeout).build().unwrap_or_default();
        Self { client, api_key, model }
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate_structured(&self, system: &str, user: &str, _schema_hint: &str) -> EngineResult<String> {
        GEMINI_CIRCUIT.check().map_err(|msg| EngineError::provider("gemini", msg))?;

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let body = json!({
            "system_instruction": {"parts": [{"text": system}]},
            "contents": [{"role": "user", "parts": [{"text": user}]}],
            "generationConfig": {"responseMimeType": "application/json"},
        });

        let mut last_err = String::new();
        for attempt in 0..MAX_RETRIES {
            let response = self.client.post(&url).json(&body).send().await;
            match response {
                Ok(resp) if resp.status().is_success() => {
                    let value: serde_json::Value = resp.json().await.map_err(EngineError::from)?;
                    let text = value["candidates"][0]["content"]["parts"][0]["text"]
                        .as_str()
                        .ok_or_else(|| EngineError::provider("gemini", "missing candidates[0].content.parts[0].text"))?
                        .to_string();
                    GEMINI_CIRCUIT.record_success();
                    return Ok(text);
                }
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    last_err = format!("HTTP {status}");
                    if !is_retryable_status(status) {
                        GEMINI_CIRCUIT.record_failure();
                        return Err(EngineError::provider("gemini", last_err));
                    }
                }
                Err(e) => {
                    last_err = e.to_string();
                }
            }
            warn!("[ai:gemini] attempt {attempt} failed: {last_err}, retrying");
            retry_delay(attempt).await;
        }

        GEMINI_CIRCUIT.record_failure();
        Err(EngineError::provider("gemini", format!("exhausted {MAX_RETRIES} retries: {last_err}")))
    }
}

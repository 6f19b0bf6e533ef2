use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::provider::{classify_status, classify_transport_error, TextGenerator, DEFAULT_TIMEOUT};
use crate::error::ProviderError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Google Generative Language `generateContent` provider.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });

        let response = self
            .http
            .post(self.endpoint())
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let response_text = response.text().await.map_err(|err| {
            ProviderError::transient(format!("Failed to read response: {err}"))
                .with_status(status.as_u16())
        })?;

        if !status.is_success() {
            return Err(classify_status(status, &response_text));
        }

        let response_json: Value = serde_json::from_str(&response_text).map_err(|err| {
            ProviderError::transient(format!("Failed to parse generateContent envelope: {err}"))
                .with_status(status.as_u16())
        })?;

        if let Some(reason) = response_json
            .pointer("/promptFeedback/blockReason")
            .and_then(Value::as_str)
        {
            warn!(target: "tinytrip::provider", provider = "gemini", reason, "prompt blocked");
            return Err(ProviderError::permanent(format!(
                "Prompt blocked by provider: {reason}"
            )));
        }

        let text = candidate_text(&response_json).ok_or_else(|| {
            let finish_reason = response_json
                .pointer("/candidates/0/finishReason")
                .and_then(Value::as_str)
                .unwrap_or("none");
            ProviderError::transient(format!(
                "Response contained no candidate text (finish reason: {finish_reason})"
            ))
        })?;

        debug!(
            target: "tinytrip::provider",
            provider = "gemini",
            model = %self.model,
            chars = text.len(),
            "candidate received"
        );
        Ok(text)
    }
}

/// Concatenated `text` parts of the first candidate.
fn candidate_text(response: &Value) -> Option<String> {
    let parts = response
        .pointer("/candidates/0/content/parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

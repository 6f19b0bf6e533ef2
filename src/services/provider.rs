use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use crate::error::ProviderError;

/// Default per-call timeout for provider requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Single-shot boundary to an external text-generation provider.
///
/// Implementations make exactly one outbound call per invocation and never
/// retry; retry policy belongs to the caller.
#[async_trait]
pub trait TextGenerator: Send + Sync + std::fmt::Debug {
    /// Short provider name used in logs
    fn name(&self) -> &'static str;

    /// Send the prompt and return the raw completion text.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Failures before any response arrived: bad URLs are permanent, the rest is network trouble.
pub(crate) fn classify_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_builder() {
        return ProviderError::permanent(format!("Invalid provider request: {err}"));
    }
    if err.is_timeout() {
        return ProviderError::transient(format!("Provider request timed out: {err}"));
    }
    ProviderError::transient(format!("HTTP request failed: {err}"))
}

/// Map a non-success HTTP status onto the transient/permanent split.
///
/// 5xx and 408 are worth retrying. Every other 4xx, including 429 quota
/// exhaustion, is permanent.
pub(crate) fn classify_status(status: StatusCode, body: &str) -> ProviderError {
    let message = api_error_message(body).unwrap_or_else(|| truncate(body, 200));
    let error = if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        ProviderError::transient(format!("HTTP {} error: {}", status, message))
    } else {
        ProviderError::permanent(format!("HTTP {} error: {}", status, message))
    };
    error.with_status(status.as_u16())
}

/// `error.message` from a JSON error body, as both supported providers return it.
pub(crate) fn api_error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    let error = json.get("error")?;
    Some(
        error
            .get("message")
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .unwrap_or_else(|| error.to_string()),
    )
}

fn truncate(text: &str, max_chars: usize) -> String {
    let mut truncated: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        truncated.push('…');
    }
    truncated
}

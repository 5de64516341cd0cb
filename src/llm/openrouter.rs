//! OpenRouter chat-completions integration.
//!
//! Implements the `InferenceProvider` trait against the OpenRouter
//! API. Handles retries with exponential backoff on rate limits and
//! server errors, and extracts a JSON object from completion text that
//! may arrive bare, fenced, or wrapped in prose.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::InferenceProvider;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Maximum retries on rate limit / server errors.
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (ms).
const BASE_BACKOFF_MS: u64 = 1000;

// ---------------------------------------------------------------------------
// API types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct OpenRouterClient {
    http: Client,
    api_key: SecretString,
    model: String,
    max_tokens: u32,
    total_calls: std::sync::atomic::AtomicU64,
}

impl OpenRouterClient {
    pub fn new(api_key: String, model: Option<String>, max_tokens: Option<u32>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .context("Failed to build OpenRouter HTTP client")?;

        Ok(Self {
            http,
            api_key: SecretString::new(api_key),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            total_calls: std::sync::atomic::AtomicU64::new(0),
        })
    }

    /// Send a chat request with retry + backoff, returning the raw
    /// completion text of the first choice.
    async fn call_api(&self, system: &str, user_message: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![
                Message { role: "system".to_string(), content: system.to_string() },
                Message { role: "user".to_string(), content: user_message.to_string() },
            ],
        };

        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = BASE_BACKOFF_MS * 2u64.pow(attempt - 1);
                debug!(attempt, delay_ms = delay, "Retrying OpenRouter call");
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            }

            let resp = self
                .http
                .post(OPENROUTER_API_URL)
                .bearer_auth(self.api_key.expose_secret())
                .header("X-Title", "EDGESCOUT")
                .json(&request)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let body: ChatResponse = response
                            .json()
                            .await
                            .context("Failed to parse OpenRouter response")?;

                        self.total_calls
                            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);

                        let text = body
                            .choices
                            .into_iter()
                            .next()
                            .map(|c| c.message.content)
                            .unwrap_or_default();

                        if text.is_empty() {
                            anyhow::bail!("OpenRouter returned an empty completion");
                        }
                        return Ok(text);
                    }

                    // Retryable: 429 (rate limit) and server errors
                    if status.as_u16() == 429 || status.as_u16() >= 500 {
                        let error_text = response.text().await.unwrap_or_default();
                        warn!(status = %status, attempt, error = %error_text, "Retryable OpenRouter error");
                        last_error = Some(format!("HTTP {status}: {error_text}"));
                        continue;
                    }

                    let error_text = response.text().await.unwrap_or_default();
                    anyhow::bail!("OpenRouter API error {status}: {error_text}");
                }
                Err(e) => {
                    warn!(attempt, error = %e, "OpenRouter request failed");
                    last_error = Some(format!("Request error: {e}"));
                    continue;
                }
            }
        }

        anyhow::bail!(
            "OpenRouter API failed after {} retries: {}",
            MAX_RETRIES,
            last_error.unwrap_or_default()
        )
    }

    /// Extract a JSON object from completion text.
    ///
    /// Accepts a bare object, a ```json fenced block, or an object
    /// embedded in surrounding prose (first `{` to last `}`).
    pub fn extract_json(text: &str) -> Result<serde_json::Value> {
        let trimmed = text.trim();

        if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
            if value.is_object() {
                return Ok(value);
            }
        }

        // Fenced block: ```json ... ``` or ``` ... ```
        if let Some(start) = trimmed.find("```") {
            let after = &trimmed[start + 3..];
            let after = after.strip_prefix("json").unwrap_or(after);
            if let Some(end) = after.find("```") {
                let inner = after[..end].trim();
                if let Ok(value) = serde_json::from_str::<serde_json::Value>(inner) {
                    if value.is_object() {
                        return Ok(value);
                    }
                }
            }
        }

        // Last resort: the outermost braces
        if let (Some(open), Some(close)) = (trimmed.find('{'), trimmed.rfind('}')) {
            if open < close {
                let inner = &trimmed[open..=close];
                if let Ok(value) = serde_json::from_str::<serde_json::Value>(inner) {
                    if value.is_object() {
                        return Ok(value);
                    }
                }
            }
        }

        anyhow::bail!("No JSON object found in completion text")
    }

    /// Total number of successful API calls made.
    pub fn total_calls(&self) -> u64 {
        self.total_calls.load(std::sync::atomic::Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// InferenceProvider implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl InferenceProvider for OpenRouterClient {
    async fn complete_json(&self, system: &str, prompt: &str) -> Result<serde_json::Value> {
        let text = self
            .call_api(system, prompt)
            .await
            .context("OpenRouter completion failed")?;

        debug!(model = %self.model, chars = text.len(), "Completion received");

        Self::extract_json(&text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_defaults() {
        let client = OpenRouterClient::new("key".to_string(), None, None).unwrap();
        assert_eq!(client.model_name(), DEFAULT_MODEL);
        assert_eq!(client.total_calls(), 0);
    }

    #[test]
    fn test_client_custom_model() {
        let client = OpenRouterClient::new(
            "key".to_string(),
            Some("anthropic/claude-3.5-sonnet".to_string()),
            Some(2048),
        )
        .unwrap();
        assert_eq!(client.model_name(), "anthropic/claude-3.5-sonnet");
    }

    #[test]
    fn test_extract_json_bare_object() {
        let value = OpenRouterClient::extract_json(r#"{"decision": "skip"}"#).unwrap();
        assert_eq!(value["decision"], "skip");
    }

    #[test]
    fn test_extract_json_fenced() {
        let text = "Here is my analysis:\n```json\n{\"decision\": \"place_bet\", \"confidence\": 0.7}\n```";
        let value = OpenRouterClient::extract_json(text).unwrap();
        assert_eq!(value["confidence"], 0.7);
    }

    #[test]
    fn test_extract_json_fence_without_language_tag() {
        let text = "```\n{\"decision\": \"skip\"}\n```";
        let value = OpenRouterClient::extract_json(text).unwrap();
        assert_eq!(value["decision"], "skip");
    }

    #[test]
    fn test_extract_json_embedded_in_prose() {
        let text = "Based on the odds I conclude {\"decision\": \"skip\", \"reasoning\": \"no edge\"} as stated.";
        let value = OpenRouterClient::extract_json(text).unwrap();
        assert_eq!(value["reasoning"], "no edge");
    }

    #[test]
    fn test_extract_json_rejects_non_object() {
        assert!(OpenRouterClient::extract_json("[1, 2, 3]").is_err());
        assert!(OpenRouterClient::extract_json("\"just a string\"").is_err());
    }

    #[test]
    fn test_extract_json_rejects_plain_text() {
        assert!(OpenRouterClient::extract_json("I cannot analyze this event.").is_err());
    }

    #[test]
    fn test_chat_response_deserialization() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "{\"decision\": \"skip\"}"}}]}"#,
        )
        .unwrap();
        assert_eq!(body.choices[0].message.content, "{\"decision\": \"skip\"}");
    }
}

//! Model inference for the externally-judged decision path.
//!
//! Defines the `InferenceProvider` trait and the OpenRouter
//! implementation. The pipeline only ever needs one operation:
//! a prompt in, a JSON object out.

pub mod openrouter;

use anyhow::Result;
use async_trait::async_trait;

/// Abstraction over JSON-returning model inference.
///
/// Implementors handle transport, retries, and extracting a JSON
/// object from the raw completion text. Schema validation of the
/// object is the caller's job.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Run a completion and parse the response as a JSON object.
    async fn complete_json(&self, system: &str, prompt: &str) -> Result<serde_json::Value>;

    /// Model identifier string (recorded on every decision).
    fn model_name(&self) -> &str;
}

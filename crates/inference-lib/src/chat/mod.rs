//! Remote chat model integration
//!
//! This module owns the provider-specific request/response body shapes and
//! the error taxonomy for one remote model invocation. The network transport
//! itself (HTTP client, credentials, per-attempt timeout) is injected through
//! [`ChatBackend`] by the host.

use crate::config::EngineConfig;
use crate::models::{ChatMessage, ChatRole};
use crate::retry::Retryable;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Provider API revision sent with every request body.
pub const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// One failed remote model invocation, as reported by the transport.
///
/// Classification rule: `Throttled` and `Connection` are transient and
/// eligible for backoff-and-retry; every other variant is a terminal fault of
/// the request or the account and is never retried.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The provider's rate-limit / throttling signal.
    #[error("remote model throttled the request: {message}")]
    Throttled { message: String },

    /// Transport-level connectivity failure (connect, reset, timeout).
    #[error("connection to remote model failed: {message}")]
    Connection { message: String },

    #[error("remote model rejected the request: {message}")]
    InvalidRequest { message: String },

    #[error("access to remote model denied: {message}")]
    AccessDenied { message: String },

    /// Any other error the provider reported, including malformed responses.
    #[error("remote model call failed: {message}")]
    Api { message: String },
}

impl Retryable for RemoteError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            RemoteError::Throttled { .. } | RemoteError::Connection { .. }
        )
    }
}

/// Request body for one generation call, in the provider's wire shape.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub anthropic_version: String,
    pub max_tokens: u32,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub top_p: f32,
}

impl ChatRequest {
    /// Build the payload for `prompt`, preserving the caller's ordered
    /// history and appending the new user turn last.
    pub fn from_history(config: &EngineConfig, prompt: &str, history: &[ChatMessage]) -> Self {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(prompt));

        Self {
            anthropic_version: ANTHROPIC_VERSION.to_string(),
            max_tokens: config.max_tokens,
            messages,
            temperature: config.temperature,
            top_p: config.top_p,
        }
    }
}

/// Response body of a successful generation call.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

impl ChatResponse {
    /// Extract the generated text, taken from the first content block.
    pub fn into_text(self) -> Option<String> {
        self.content.into_iter().next().map(|block| block.text)
    }
}

/// One block of model output.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub text: String,
}

/// Transport collaborator performing a single remote model invocation.
///
/// Implementations own authentication and the latency of one attempt; the
/// engine only bounds retries around them.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn invoke_model(
        &self,
        model_id: &str,
        request: &ChatRequest,
    ) -> Result<ChatResponse, RemoteError>;
}

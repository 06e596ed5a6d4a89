//! LLM provider abstractions.
//!
//! This module defines the trait every vendor adapter implements, plus the
//! adapters for OpenAI, Anthropic, DeepSeek, and Perplexity. All adapters
//! use the [`secrets`] module for credential handling and register through
//! the [`factory`] registry so the engine never touches vendor SDK state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::stream::StreamEvent;

mod anthropic;
mod deepseek;
mod factory;
mod openai;
mod openai_compat;
mod perplexity;
pub mod secrets;
mod sse;

pub use anthropic::{AnthropicProvider, AnthropicProviderFactory, ANTHROPIC_API_KEY_ENV};
pub use deepseek::{DeepSeekProvider, DeepSeekProviderFactory, DEEPSEEK_API_KEY_ENV};
pub use factory::{ProviderFactory, ProviderRegistry};
pub use openai::{OpenAiProvider, OpenAiProviderFactory, OPENAI_API_KEY_ENV};
pub use perplexity::{PerplexityProvider, PerplexityProviderFactory, PERPLEXITY_API_KEY_ENV};
pub use secrets::{ApiCredential, CredentialSource};
pub use sse::{data_payload, SseLineBuffer, DONE_FRAME};

/// Errors from LLM providers.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// Configuration for a completion request.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Model override; `None` uses the provider's default.
    pub model: Option<String>,

    /// Maximum tokens to generate.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f32,

    /// Request timeout.
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 4000,
            temperature: 0.1,
            timeout: Duration::from_secs(120),
        }
    }
}

/// A chat message for LLM completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", or "assistant"
    pub role: String,

    /// Message content
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Response from an LLM completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated content, accumulated for streaming calls.
    pub content: String,

    /// Token usage, when the vendor reports it.
    pub usage: TokenUsage,

    /// Model that served the request.
    pub model: String,

    /// Stop reason, if reported.
    pub stop_reason: Option<String>,
}

/// Token usage from a completion.
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Provider abstraction allows swapping LLM backends.
///
/// This is the only place where vendor HTTP calls are made. The engine and
/// orchestrators above it only see this trait.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Execute a buffered chat completion.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Execute a streaming chat completion.
    ///
    /// Text fragments are sent through `tx` as [`StreamEvent::Delta`] in
    /// arrival order; the accumulated response is also returned. When
    /// `cancel` fires the adapter stops reading and returns what it has
    /// accumulated with stop reason `"cancelled"`.
    async fn complete_stream(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
        tx: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Check if the provider has a usable credential.
    async fn health_check(&self) -> bool;

    /// Provider name for logs and reports.
    fn name(&self) -> &str;

    /// Estimate tokens for a prompt.
    fn estimate_tokens(&self, text: &str) -> u32 {
        // Rough estimate: ~4 chars per token
        (text.len() / 4) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_message_constructors() {
        assert_eq!(ChatMessage::system("be terse").role, "system");
        assert_eq!(ChatMessage::user("hello").role, "user");
        assert_eq!(ChatMessage::assistant("hi").role, "assistant");
    }

    #[test]
    fn token_usage_total() {
        let usage = TokenUsage {
            prompt_tokens: 120,
            completion_tokens: 40,
        };
        assert_eq!(usage.total(), 160);
    }

    #[test]
    fn completion_config_defaults() {
        let config = CompletionConfig::default();
        assert!(config.model.is_none());
        assert_eq!(config.max_tokens, 4000);
        assert!((config.temperature - 0.1).abs() < f32::EPSILON);
    }
}

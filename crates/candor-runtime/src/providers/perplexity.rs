//! Perplexity provider implementation.
//!
//! Perplexity exposes an OpenAI-compatible chat-completion API; wire
//! handling is shared with the OpenAI adapter.

use serde_json::Value as JsonValue;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::factory::ProviderFactory;
use super::openai_compat;
use super::secrets::{ApiCredential, CredentialSource};
use super::{ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError};
use crate::stream::StreamEvent;
use async_trait::async_trait;

/// Environment variable name for the Perplexity API key.
pub const PERPLEXITY_API_KEY_ENV: &str = "PERPLEXITY_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";
const DEFAULT_MODEL: &str = "sonar";

/// Perplexity chat-completion provider.
pub struct PerplexityProvider {
    credential: ApiCredential,
    base_url: String,
    default_model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for PerplexityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerplexityProvider")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl PerplexityProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            credential: ApiCredential::new(
                api_key,
                CredentialSource::Programmatic,
                "Perplexity API key",
            ),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &JsonValue) -> Result<Self, ProviderError> {
        let credential = ApiCredential::from_config_or_env(
            config,
            "api_key",
            PERPLEXITY_API_KEY_ENV,
            "Perplexity API key",
        )?;
        Ok(Self {
            credential,
            base_url: config["base_url"]
                .as_str()
                .unwrap_or(DEFAULT_BASE_URL)
                .to_string(),
            default_model: config["model"].as_str().unwrap_or(DEFAULT_MODEL).to_string(),
            client: reqwest::Client::new(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn model<'a>(&'a self, config: &'a CompletionConfig) -> &'a str {
        config.model.as_deref().unwrap_or(&self.default_model)
    }
}

#[async_trait]
impl LlmProvider for PerplexityProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        openai_compat::send_chat(
            &self.client,
            &self.endpoint(),
            &self.credential,
            self.model(config),
            messages,
            config,
        )
        .await
    }

    async fn complete_stream(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
        tx: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> Result<CompletionResponse, ProviderError> {
        openai_compat::stream_chat(
            &self.client,
            &self.endpoint(),
            &self.credential,
            self.model(config),
            messages,
            config,
            tx,
            cancel,
        )
        .await
    }

    async fn health_check(&self) -> bool {
        !self.credential.is_empty()
    }

    fn name(&self) -> &str {
        "perplexity"
    }
}

/// Factory for creating Perplexity providers from configuration.
pub struct PerplexityProviderFactory;

impl ProviderFactory for PerplexityProviderFactory {
    fn provider_type(&self) -> &'static str {
        "perplexity"
    }

    fn create(&self, config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        Ok(Arc::new(PerplexityProvider::from_config(config)?))
    }

    fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError> {
        if !ApiCredential::is_available(config, "api_key", PERPLEXITY_API_KEY_ENV) {
            return Err(ProviderError::NotConfigured(format!(
                "Perplexity API key required: set 'api_key' in config or {} env",
                PERPLEXITY_API_KEY_ENV
            )));
        }
        Ok(())
    }

    fn default_config(&self) -> JsonValue {
        serde_json::json!({ "model": DEFAULT_MODEL })
    }

    fn description(&self) -> &'static str {
        "Perplexity chat-completion provider (OpenAI-compatible API)"
    }
}

//! DeepSeek provider implementation.
//!
//! DeepSeek exposes an OpenAI-compatible chat-completion API, so the wire
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

/// Environment variable name for the DeepSeek API key.
pub const DEEPSEEK_API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
const DEFAULT_MODEL: &str = "deepseek-chat";

/// DeepSeek chat-completion provider.
pub struct DeepSeekProvider {
    credential: ApiCredential,
    base_url: String,
    default_model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for DeepSeekProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepSeekProvider")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl DeepSeekProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            credential: ApiCredential::new(
                api_key,
                CredentialSource::Programmatic,
                "DeepSeek API key",
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
            DEEPSEEK_API_KEY_ENV,
            "DeepSeek API key",
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
impl LlmProvider for DeepSeekProvider {
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
        "deepseek"
    }
}

/// Factory for creating DeepSeek providers from configuration.
pub struct DeepSeekProviderFactory;

impl ProviderFactory for DeepSeekProviderFactory {
    fn provider_type(&self) -> &'static str {
        "deepseek"
    }

    fn create(&self, config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        Ok(Arc::new(DeepSeekProvider::from_config(config)?))
    }

    fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError> {
        if !ApiCredential::is_available(config, "api_key", DEEPSEEK_API_KEY_ENV) {
            return Err(ProviderError::NotConfigured(format!(
                "DeepSeek API key required: set 'api_key' in config or {} env",
                DEEPSEEK_API_KEY_ENV
            )));
        }
        Ok(())
    }

    fn default_config(&self) -> JsonValue {
        serde_json::json!({ "model": DEFAULT_MODEL })
    }

    fn description(&self) -> &'static str {
        "DeepSeek chat-completion provider (OpenAI-compatible API)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_name_and_endpoint() {
        let provider = DeepSeekProvider::new("test-key");
        assert_eq!(provider.name(), "deepseek");
        assert_eq!(provider.endpoint(), "https://api.deepseek.com/chat/completions");
    }

    #[test]
    fn factory_default_model() {
        let factory = DeepSeekProviderFactory;
        assert_eq!(factory.default_config()["model"], "deepseek-chat");
    }
}

//! OpenAI provider implementation.

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

/// Environment variable name for the OpenAI API key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";

/// OpenAI chat-completion provider.
pub struct OpenAiProvider {
    credential: ApiCredential,
    base_url: String,
    default_model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            credential: ApiCredential::new(
                api_key,
                CredentialSource::Programmatic,
                "OpenAI API key",
            ),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Result<Self, ProviderError> {
        let credential = ApiCredential::from_env(OPENAI_API_KEY_ENV, "OpenAI API key")?;
        Ok(Self {
            credential,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            client: reqwest::Client::new(),
        })
    }

    pub fn from_config(config: &JsonValue) -> Result<Self, ProviderError> {
        let credential = ApiCredential::from_config_or_env(
            config,
            "api_key",
            OPENAI_API_KEY_ENV,
            "OpenAI API key",
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
impl LlmProvider for OpenAiProvider {
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
        "openai"
    }
}

/// Factory for creating OpenAI providers from configuration.
pub struct OpenAiProviderFactory;

impl ProviderFactory for OpenAiProviderFactory {
    fn provider_type(&self) -> &'static str {
        "openai"
    }

    fn create(&self, config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        Ok(Arc::new(OpenAiProvider::from_config(config)?))
    }

    fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError> {
        if !ApiCredential::is_available(config, "api_key", OPENAI_API_KEY_ENV) {
            return Err(ProviderError::NotConfigured(format!(
                "OpenAI API key required: set 'api_key' in config or {} env",
                OPENAI_API_KEY_ENV
            )));
        }
        Ok(())
    }

    fn default_config(&self) -> JsonValue {
        serde_json::json!({ "model": DEFAULT_MODEL })
    }

    fn description(&self) -> &'static str {
        "OpenAI chat-completion provider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_name() {
        let provider = OpenAiProvider::new("test-key");
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn model_override() {
        let provider = OpenAiProvider::new("test-key");
        let default = CompletionConfig::default();
        assert_eq!(provider.model(&default), "gpt-4o");

        let override_config = CompletionConfig {
            model: Some("gpt-4-turbo".to_string()),
            ..CompletionConfig::default()
        };
        assert_eq!(provider.model(&override_config), "gpt-4-turbo");
    }

    #[test]
    fn api_key_not_in_debug_output() {
        let provider = OpenAiProvider::new("sk-very-secret");
        let debug = format!("{:?}", provider);
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn factory_creates_from_config() {
        let factory = OpenAiProviderFactory;
        let config = serde_json::json!({"api_key": "test", "model": "gpt-4o-mini"});
        let provider = factory.create(&config).unwrap();
        assert_eq!(provider.name(), "openai");
    }
}

//! Anthropic Claude provider implementation.
//!
//! Speaks the messages API: system prompt carried out-of-band, content
//! returned as typed blocks, streaming delivered as typed SSE frames
//! (`content_block_delta` / `message_delta` / `message_stop`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::factory::ProviderFactory;
use super::secrets::{ApiCredential, CredentialSource};
use super::sse::{data_payload, SseLineBuffer};
use super::{ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError, TokenUsage};
use crate::stream::StreamEvent;

/// Environment variable name for the Anthropic API key.
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const API_VERSION: &str = "2023-06-01";

/// Anthropic Claude provider.
pub struct AnthropicProvider {
    credential: ApiCredential,
    base_url: String,
    default_model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            credential: ApiCredential::new(
                api_key,
                CredentialSource::Programmatic,
                "Anthropic API key",
            ),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Result<Self, ProviderError> {
        let credential = ApiCredential::from_env(ANTHROPIC_API_KEY_ENV, "Anthropic API key")?;
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
            ANTHROPIC_API_KEY_ENV,
            "Anthropic API key",
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

    fn model<'a>(&'a self, config: &'a CompletionConfig) -> &'a str {
        config.model.as_deref().unwrap_or(&self.default_model)
    }

    fn build_request(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
        stream: bool,
    ) -> AnthropicRequest {
        // The messages API carries the system prompt out-of-band.
        let mut system = None;
        let mut conversation = Vec::new();
        for msg in messages {
            if msg.role == "system" {
                system = Some(msg.content);
            } else {
                conversation.push(AnthropicMessage {
                    role: msg.role,
                    content: msg.content,
                });
            }
        }

        AnthropicRequest {
            model: self.model(config).to_string(),
            max_tokens: config.max_tokens,
            system,
            messages: conversation,
            temperature: Some(config.temperature),
            stream,
        }
    }

    async fn post(
        &self,
        request: &AnthropicRequest,
        config: &CompletionConfig,
    ) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", self.credential.expose())
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .timeout(config.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(config.timeout)
                } else {
                    ProviderError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(std::time::Duration::from_secs);
            return Err(ProviderError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

/// Anthropic API request format.
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

/// Anthropic API response format.
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    model: String,
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    #[allow(dead_code)] // Required for deserialization, not read directly
    type_: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

/// One typed frame of an Anthropic SSE stream.
#[derive(Debug, Deserialize)]
struct StreamFrame {
    #[serde(rename = "type")]
    kind: String,
    delta: Option<FrameDelta>,
    usage: Option<AnthropicUsage>,
    message: Option<StartMessage>,
}

#[derive(Debug, Deserialize)]
struct FrameDelta {
    text: Option<String>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StartMessage {
    usage: Option<AnthropicUsage>,
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let request = self.build_request(messages, config, false);
        let response = self.post(&request, config).await?;

        let body: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let content = body
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(CompletionResponse {
            content,
            usage: TokenUsage {
                prompt_tokens: body.usage.input_tokens,
                completion_tokens: body.usage.output_tokens,
            },
            model: body.model,
            stop_reason: body.stop_reason,
        })
    }

    async fn complete_stream(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
        tx: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> Result<CompletionResponse, ProviderError> {
        use futures::StreamExt;

        let request = self.build_request(messages, config, true);
        let model = request.model.clone();
        let response = self.post(&request, config).await?;

        let mut byte_stream = response.bytes_stream();
        let mut lines = SseLineBuffer::new();
        let mut accumulated = String::new();
        let mut usage = TokenUsage::default();
        let mut stop_reason: Option<String> = None;
        let mut cancelled = false;

        'read: loop {
            let chunk = tokio::select! {
                _ = cancel.cancelled() => {
                    cancelled = true;
                    break 'read;
                }
                chunk = byte_stream.next() => chunk,
            };

            let Some(chunk) = chunk else { break };
            let chunk = chunk.map_err(|e| ProviderError::HttpError(e.to_string()))?;

            for line in lines.push(&chunk) {
                let Some(payload) = data_payload(&line) else {
                    continue;
                };
                let Ok(frame) = serde_json::from_str::<StreamFrame>(payload) else {
                    continue;
                };

                match frame.kind.as_str() {
                    "content_block_delta" => {
                        if let Some(text) = frame.delta.and_then(|d| d.text) {
                            if !text.is_empty() {
                                accumulated.push_str(&text);
                                let _ = tx.send(StreamEvent::delta(text)).await;
                            }
                        }
                    }
                    "message_start" => {
                        if let Some(u) = frame.message.and_then(|m| m.usage) {
                            usage.prompt_tokens = u.input_tokens;
                        }
                    }
                    "message_delta" => {
                        if let Some(u) = frame.usage {
                            usage.completion_tokens = u.output_tokens;
                        }
                        if let Some(reason) = frame.delta.and_then(|d| d.stop_reason) {
                            stop_reason = Some(reason);
                        }
                    }
                    "message_stop" => break 'read,
                    _ => {}
                }
            }
        }

        if cancelled {
            stop_reason = Some("cancelled".to_string());
        }

        Ok(CompletionResponse {
            content: accumulated,
            usage,
            model,
            stop_reason,
        })
    }

    async fn health_check(&self) -> bool {
        !self.credential.is_empty()
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

/// Factory for creating Anthropic providers from configuration.
pub struct AnthropicProviderFactory;

impl ProviderFactory for AnthropicProviderFactory {
    fn provider_type(&self) -> &'static str {
        "anthropic"
    }

    fn create(&self, config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        Ok(Arc::new(AnthropicProvider::from_config(config)?))
    }

    fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError> {
        if !ApiCredential::is_available(config, "api_key", ANTHROPIC_API_KEY_ENV) {
            return Err(ProviderError::NotConfigured(format!(
                "Anthropic API key required: set 'api_key' in config or {} env",
                ANTHROPIC_API_KEY_ENV
            )));
        }

        if let Some(url) = config["base_url"].as_str() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ProviderError::NotConfigured(
                    "base_url must start with http:// or https://".to_string(),
                ));
            }
        }

        Ok(())
    }

    fn default_config(&self) -> JsonValue {
        serde_json::json!({ "model": DEFAULT_MODEL })
    }

    fn description(&self) -> &'static str {
        "Anthropic Claude messages-API provider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_name() {
        let provider = AnthropicProvider::new("test-key");
        assert_eq!(provider.name(), "anthropic");
    }

    #[test]
    fn system_message_is_carried_out_of_band() {
        let provider = AnthropicProvider::new("test-key");
        let request = provider.build_request(
            vec![
                ChatMessage::system("You are an expert intelligence evaluator."),
                ChatMessage::user("Evaluate this."),
            ],
            &CompletionConfig::default(),
            false,
        );
        assert_eq!(
            request.system.as_deref(),
            Some("You are an expert intelligence evaluator.")
        );
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
    }

    #[test]
    fn stream_frames_parse() {
        let frame: StreamFrame = serde_json::from_str(
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}"#,
        )
        .unwrap();
        assert_eq!(frame.kind, "content_block_delta");
        assert_eq!(frame.delta.unwrap().text.as_deref(), Some("Hi"));

        let frame: StreamFrame = serde_json::from_str(
            r#"{"type":"message_delta","delta":{"stop_reason":"end_turn"},"usage":{"output_tokens":42}}"#,
        )
        .unwrap();
        assert_eq!(frame.usage.unwrap().output_tokens, 42);
    }

    #[test]
    fn api_key_not_in_debug_output() {
        let secret = "sk-ant-REDACTED";
        let provider = AnthropicProvider::new(secret);
        let debug = format!("{:?}", provider);
        assert!(!debug.contains(secret), "API key was exposed in Debug output");
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn health_check_reflects_credential() {
        assert!(AnthropicProvider::new("sk-ant-key").health_check().await);
        assert!(!AnthropicProvider::new("").health_check().await);
    }

    #[test]
    fn factory_validates_base_url() {
        let factory = AnthropicProviderFactory;
        let config = serde_json::json!({"api_key": "k", "base_url": "not-a-url"});
        assert!(factory.validate_config(&config).is_err());

        let config = serde_json::json!({"api_key": "k", "base_url": "https://proxy.local/v1"});
        assert!(factory.validate_config(&config).is_ok());
    }

    #[test]
    fn from_config_reads_fields() {
        let config = serde_json::json!({
            "api_key": "config-key",
            "base_url": "https://custom.api.com/v1",
            "model": "claude-3-7-sonnet-20250219"
        });
        let provider = AnthropicProvider::from_config(&config).unwrap();
        assert_eq!(provider.base_url, "https://custom.api.com/v1");
        assert_eq!(provider.default_model, "claude-3-7-sonnet-20250219");
        assert_eq!(provider.credential.source(), CredentialSource::Config);
    }
}

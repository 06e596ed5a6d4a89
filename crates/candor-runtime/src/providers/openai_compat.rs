//! OpenAI-compatible chat-completion wire format.
//!
//! OpenAI, DeepSeek, and Perplexity all speak this format: a JSON POST to
//! `/chat/completions` with Bearer auth, and a streaming variant of
//! newline-delimited `data: {json}` frames terminated by `data: [DONE]`.
//! The three adapters share the request/response types and the send/stream
//! helpers here; only base URL, credential, and default model differ.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::sse::{data_payload, SseLineBuffer, DONE_FRAME};
use super::{ApiCredential, ChatMessage, CompletionConfig, CompletionResponse, ProviderError, TokenUsage};
use crate::stream::StreamEvent;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: Option<String>,
    choices: Vec<Choice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<WireMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Option<Delta>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: WireErrorDetail,
}

#[derive(Debug, Deserialize)]
struct WireErrorDetail {
    message: String,
}

fn map_send_error(err: reqwest::Error, config: &CompletionConfig) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(config.timeout)
    } else {
        ProviderError::HttpError(err.to_string())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
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
        let message = serde_json::from_str::<WireError>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        return Err(ProviderError::ApiError {
            status: status.as_u16(),
            message,
        });
    }

    Ok(response)
}

/// Buffered completion against an OpenAI-compatible endpoint.
pub(super) async fn send_chat(
    client: &reqwest::Client,
    url: &str,
    credential: &ApiCredential,
    model: &str,
    messages: Vec<ChatMessage>,
    config: &CompletionConfig,
) -> Result<CompletionResponse, ProviderError> {
    let request = ChatRequest {
        model,
        messages: &messages,
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        stream: false,
    };

    let response = client
        .post(url)
        .bearer_auth(credential.expose())
        .timeout(config.timeout)
        .json(&request)
        .send()
        .await
        .map_err(|e| map_send_error(e, config))?;

    let response = check_status(response).await?;

    let body: ChatResponse = response
        .json()
        .await
        .map_err(|e| ProviderError::ParseError(e.to_string()))?;

    let content = body
        .choices
        .first()
        .and_then(|c| c.message.as_ref())
        .and_then(|m| m.content.clone())
        .unwrap_or_default();

    let stop_reason = body.choices.first().and_then(|c| c.finish_reason.clone());

    Ok(CompletionResponse {
        content,
        usage: body
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            })
            .unwrap_or_default(),
        model: body.model.unwrap_or_else(|| model.to_string()),
        stop_reason,
    })
}

/// Streaming completion against an OpenAI-compatible endpoint.
///
/// Deltas go through `tx` in arrival order; unparsable frames are skipped,
/// matching the lenient behavior of the vendor SDKs. On cancellation the
/// read loop stops and the accumulated text is returned with stop reason
/// `"cancelled"`.
pub(super) async fn stream_chat(
    client: &reqwest::Client,
    url: &str,
    credential: &ApiCredential,
    model: &str,
    messages: Vec<ChatMessage>,
    config: &CompletionConfig,
    tx: mpsc::Sender<StreamEvent>,
    cancel: CancellationToken,
) -> Result<CompletionResponse, ProviderError> {
    use futures::StreamExt;

    let request = ChatRequest {
        model,
        messages: &messages,
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        stream: true,
    };

    let response = client
        .post(url)
        .bearer_auth(credential.expose())
        .timeout(config.timeout)
        .json(&request)
        .send()
        .await
        .map_err(|e| map_send_error(e, config))?;

    let response = check_status(response).await?;

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
            if payload == DONE_FRAME {
                break 'read;
            }

            let Ok(parsed) = serde_json::from_str::<StreamChunk>(payload) else {
                continue;
            };
            if let Some(u) = parsed.usage {
                usage.prompt_tokens = u.prompt_tokens;
                usage.completion_tokens = u.completion_tokens;
            }
            for choice in parsed.choices {
                if let Some(reason) = choice.finish_reason {
                    stop_reason = Some(reason);
                }
                if let Some(content) = choice.delta.and_then(|d| d.content) {
                    if !content.is_empty() {
                        accumulated.push_str(&content);
                        let _ = tx.send(StreamEvent::delta(content)).await;
                    }
                }
            }
        }
    }

    if cancelled {
        stop_reason = Some("cancelled".to_string());
    }

    Ok(CompletionResponse {
        content: accumulated,
        usage,
        model: model.to_string(),
        stop_reason,
    })
}

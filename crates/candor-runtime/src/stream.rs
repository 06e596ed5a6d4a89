//! Streaming relay between provider adapters and consumers.
//!
//! The stream carries structured event records rather than bare text:
//! consumers that need the legacy plain-text wire format (raw fragments
//! with in-band `[COMPLETED]` / `ERROR:` markers) render events through
//! [`render_plain`]. Fragments are delivered in arrival order, at least
//! once, with no batching guarantee. Cancellation is cooperative: once the
//! token fires no further fragments are forwarded and no completion marker
//! is emitted.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::providers::{ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError};

/// One record of an evaluation or rewrite stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A text fragment, exactly as received from the provider.
    Delta { content: String },
    /// A protocol phase is about to run.
    PhaseStarted { phase: u8, label: String },
    /// A score was extracted from a completed phase.
    ScoreExtracted { phase: u8, score: u8 },
    /// The run finished. Absent score means the run produced none.
    Completed { final_score: Option<u8> },
    /// The run failed; the stream ends after this event.
    Error { message: String },
}

impl StreamEvent {
    pub fn delta(content: impl Into<String>) -> Self {
        StreamEvent::Delta {
            content: content.into(),
        }
    }
}

/// Render an event in the legacy plain-text wire format.
pub fn render_plain(event: &StreamEvent) -> String {
    match event {
        StreamEvent::Delta { content } => content.clone(),
        StreamEvent::PhaseStarted { phase, label } => {
            format!("\n\n=== PHASE {phase}: {label} ===\n\n")
        }
        StreamEvent::ScoreExtracted { phase, score } => {
            format!("\n\n[PHASE {phase} SCORE] {score}/100\n")
        }
        StreamEvent::Completed { final_score } => match final_score {
            Some(score) => format!("\n\n[COMPLETED] Final Score: {score}/100"),
            None => "\n\n[COMPLETED] Final Score: N/A/100".to_string(),
        },
        StreamEvent::Error { message } => format!("\n\nERROR: {message}"),
    }
}

/// Callback that receives stream events as they arrive.
pub type EventSink<'a> = &'a mut (dyn FnMut(StreamEvent) + Send);

/// Forwards provider stream fragments to a caller-supplied sink.
///
/// One relay drives one logical run (which may span several provider
/// calls). Ordering is preserved within each call; provider errors are
/// surfaced both in-band (an [`StreamEvent::Error`] through the sink) and
/// as the returned `Err`, since the plain-text transport has no
/// out-of-band error channel.
pub struct StreamingRelay {
    cancel: CancellationToken,
}

impl StreamingRelay {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
        }
    }

    /// A relay observing an external cancellation token.
    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Token that cancels this relay's in-flight provider call.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drive one streaming provider call, forwarding each fragment to the
    /// sink as it arrives.
    ///
    /// Returns the accumulated response. On provider failure the error is
    /// first emitted in-band and then returned.
    pub async fn forward(
        &self,
        provider: Arc<dyn LlmProvider>,
        messages: Vec<ChatMessage>,
        config: CompletionConfig,
        sink: EventSink<'_>,
    ) -> Result<CompletionResponse, ProviderError> {
        let (tx, mut rx) = mpsc::channel(64);
        let cancel = self.cancel.clone();

        let call = tokio::spawn(async move {
            provider.complete_stream(messages, &config, tx, cancel).await
        });

        // The channel closes when the provider call drops its sender, so
        // this loop drains every fragment before the join below.
        while let Some(event) = rx.recv().await {
            sink(event);
        }

        match call.await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => {
                sink(StreamEvent::Error {
                    message: err.to_string(),
                });
                Err(err)
            }
            Err(join_err) => {
                let err = ProviderError::HttpError(format!("stream task failed: {join_err}"));
                sink(StreamEvent::Error {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Emit the terminal completion marker, unless the relay was cancelled.
    pub fn complete(&self, sink: EventSink<'_>, final_score: Option<u8>) {
        if !self.cancel.is_cancelled() {
            sink(StreamEvent::Completed { final_score });
        }
    }
}

impl Default for StreamingRelay {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::TokenUsage;
    use async_trait::async_trait;

    /// Emits a fixed sequence of fragments, honoring cancellation.
    struct ScriptedStream {
        fragments: Vec<&'static str>,
        fail_after: Option<usize>,
    }

    #[async_trait]
    impl LlmProvider for ScriptedStream {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            unreachable!("streaming only")
        }

        async fn complete_stream(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
            tx: mpsc::Sender<StreamEvent>,
            cancel: CancellationToken,
        ) -> Result<CompletionResponse, ProviderError> {
            let mut accumulated = String::new();
            for (i, fragment) in self.fragments.iter().enumerate() {
                if self.fail_after == Some(i) {
                    return Err(ProviderError::HttpError("connection reset".to_string()));
                }
                if cancel.is_cancelled() {
                    return Ok(CompletionResponse {
                        content: accumulated,
                        usage: TokenUsage::default(),
                        model: "scripted".to_string(),
                        stop_reason: Some("cancelled".to_string()),
                    });
                }
                accumulated.push_str(fragment);
                let _ = tx.send(StreamEvent::delta(*fragment)).await;
            }
            Ok(CompletionResponse {
                content: accumulated,
                usage: TokenUsage::default(),
                model: "scripted".to_string(),
                stop_reason: Some("stop".to_string()),
            })
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn collect_sink(events: &mut Vec<StreamEvent>) -> impl FnMut(StreamEvent) + Send + '_ {
        move |event| events.push(event)
    }

    #[tokio::test]
    async fn fragments_arrive_in_order() {
        let relay = StreamingRelay::new();
        let provider = Arc::new(ScriptedStream {
            fragments: vec!["The ", "argument ", "holds."],
            fail_after: None,
        });

        let mut events = Vec::new();
        let mut sink = collect_sink(&mut events);
        let response = relay
            .forward(
                provider,
                vec![ChatMessage::user("go")],
                CompletionConfig::default(),
                &mut sink,
            )
            .await
            .unwrap();
        relay.complete(&mut sink, Some(91));
        drop(sink);

        assert_eq!(response.content, "The argument holds.");
        assert_eq!(
            events,
            vec![
                StreamEvent::delta("The "),
                StreamEvent::delta("argument "),
                StreamEvent::delta("holds."),
                StreamEvent::Completed {
                    final_score: Some(91)
                },
            ]
        );
    }

    #[tokio::test]
    async fn mid_stream_error_is_emitted_in_band() {
        let relay = StreamingRelay::new();
        let provider = Arc::new(ScriptedStream {
            fragments: vec!["partial ", "output"],
            fail_after: Some(1),
        });

        let mut events = Vec::new();
        let mut sink = collect_sink(&mut events);
        let result = relay
            .forward(
                provider,
                vec![ChatMessage::user("go")],
                CompletionConfig::default(),
                &mut sink,
            )
            .await;
        drop(sink);

        assert!(result.is_err());
        assert_eq!(events[0], StreamEvent::delta("partial "));
        match events.last().unwrap() {
            StreamEvent::Error { message } => assert!(message.contains("connection reset")),
            other => panic!("expected Error event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancellation_suppresses_completion_marker() {
        let relay = StreamingRelay::new();
        relay.cancel_token().cancel();

        let provider = Arc::new(ScriptedStream {
            fragments: vec!["never ", "forwarded"],
            fail_after: None,
        });

        let mut events = Vec::new();
        let mut sink = collect_sink(&mut events);
        let response = relay
            .forward(
                provider,
                vec![ChatMessage::user("go")],
                CompletionConfig::default(),
                &mut sink,
            )
            .await
            .unwrap();
        relay.complete(&mut sink, Some(80));
        drop(sink);

        assert_eq!(response.stop_reason.as_deref(), Some("cancelled"));
        assert!(events.is_empty(), "no fragments and no completion marker");
    }

    #[test]
    fn plain_rendering_matches_wire_format() {
        assert_eq!(render_plain(&StreamEvent::delta("chunk")), "chunk");
        assert_eq!(
            render_plain(&StreamEvent::Completed {
                final_score: Some(92)
            }),
            "\n\n[COMPLETED] Final Score: 92/100"
        );
        assert_eq!(
            render_plain(&StreamEvent::Error {
                message: "boom".to_string()
            }),
            "\n\nERROR: boom"
        );
    }
}

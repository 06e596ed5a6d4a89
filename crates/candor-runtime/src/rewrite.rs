//! Rewrite orchestration: score, rewrite, clean, rescore.

use std::sync::Arc;

use candor_core::prompts;
use candor_core::report;
use candor_core::{EvaluationRequest, EvaluationType, ProviderKind, RewriteResult};

use crate::config::RuntimeConfig;
use crate::engine::{ProtocolEngine, RuntimeError};
use crate::providers::{ChatMessage, LlmProvider};
use crate::stream::{EventSink, StreamingRelay};

/// Instructions note recorded when the caller supplies none.
const DEFAULT_INSTRUCTIONS_NOTE: &str = "Default intelligence optimization";

/// A rewrite request. Empty text is rejected before any provider call.
#[derive(Debug, Clone)]
pub struct RewriteRequest {
    pub text: String,
    pub custom_instructions: Option<String>,
}

impl RewriteRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            custom_instructions: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.custom_instructions = Some(instructions.into());
        self
    }
}

/// Wraps the protocol engine around a rewrite call, reporting before and
/// after scores. Any provider failure aborts the whole operation.
pub struct RewriteOrchestrator {
    provider: Arc<dyn LlmProvider>,
    kind: ProviderKind,
    config: RuntimeConfig,
}

impl RewriteOrchestrator {
    pub fn new(provider: Arc<dyn LlmProvider>, kind: ProviderKind, config: RuntimeConfig) -> Self {
        Self {
            provider,
            kind,
            config,
        }
    }

    /// Score the text, rewrite it, score the rewrite.
    pub async fn rewrite(&self, request: RewriteRequest) -> Result<RewriteResult, RuntimeError> {
        let original_request =
            EvaluationRequest::new(request.text.clone(), self.kind, EvaluationType::Intelligence)?;

        let engine = ProtocolEngine::new(self.provider.clone(), self.config.clone());

        let original = engine.run(&original_request).await?;
        tracing::info!(score = original.final_score, "original text scored");

        let rewritten_text = self.invoke_rewrite(&request).await?;

        let rewritten_request =
            EvaluationRequest::new(rewritten_text.clone(), self.kind, EvaluationType::Intelligence)?;
        let rewritten = engine.run(&rewritten_request).await?;
        tracing::info!(
            original = original.final_score,
            rewritten = rewritten.final_score,
            "rewrite scored"
        );

        Ok(self.assemble(
            request,
            rewritten_text,
            original.final_score,
            rewritten.final_score,
        ))
    }

    /// Streaming variant: the rewritten text streams through the relay as
    /// it is generated; scoring runs are buffered. The completion marker
    /// carries the rewritten score.
    pub async fn rewrite_streaming(
        &self,
        request: RewriteRequest,
        relay: &StreamingRelay,
        sink: EventSink<'_>,
    ) -> Result<RewriteResult, RuntimeError> {
        let original_request =
            EvaluationRequest::new(request.text.clone(), self.kind, EvaluationType::Intelligence)?;

        let engine = ProtocolEngine::new(self.provider.clone(), self.config.clone());
        let original = engine.run(&original_request).await?;

        let prompt = prompts::rewrite_prompt(&request.text, request.custom_instructions.as_deref());
        let response = relay
            .forward(
                self.provider.clone(),
                vec![ChatMessage::user(prompt)],
                self.config.completion_config(),
                &mut *sink,
            )
            .await?;
        if relay.is_cancelled() {
            return Err(RuntimeError::Cancelled);
        }
        let rewritten_text = report::clean_rewrite_output(&response.content);

        let rewritten_request =
            EvaluationRequest::new(rewritten_text.clone(), self.kind, EvaluationType::Intelligence)?;
        let rewritten = engine.run(&rewritten_request).await?;

        relay.complete(&mut *sink, Some(rewritten.final_score));

        Ok(self.assemble(
            request,
            rewritten_text,
            original.final_score,
            rewritten.final_score,
        ))
    }

    /// Rewrite a pre-split document chunk by chunk, pausing between calls
    /// as a courtesy throttle. Scores are not recomputed per chunk.
    pub async fn rewrite_chunks(
        &self,
        chunks: &[String],
        custom_instructions: Option<&str>,
    ) -> Result<Vec<String>, RuntimeError> {
        let mut rewritten = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.chunk_delay).await;
            }
            tracing::debug!(chunk = index, total = chunks.len(), "rewriting chunk");
            let prompt = prompts::rewrite_prompt(chunk, custom_instructions);
            let response = self
                .provider
                .complete(
                    vec![ChatMessage::user(prompt)],
                    &self.config.completion_config(),
                )
                .await?;
            rewritten.push(report::clean_rewrite_output(&response.content));
        }
        Ok(rewritten)
    }

    async fn invoke_rewrite(&self, request: &RewriteRequest) -> Result<String, RuntimeError> {
        let prompt = prompts::rewrite_prompt(&request.text, request.custom_instructions.as_deref());
        let response = self
            .provider
            .complete(
                vec![ChatMessage::user(prompt)],
                &self.config.completion_config(),
            )
            .await?;
        Ok(report::clean_rewrite_output(&response.content))
    }

    fn assemble(
        &self,
        request: RewriteRequest,
        rewritten_text: String,
        original_score: u8,
        rewritten_score: u8,
    ) -> RewriteResult {
        let instructions = request
            .custom_instructions
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_INSTRUCTIONS_NOTE.to_string());
        let delta_report = report::rewrite_report(
            original_score,
            rewritten_score,
            self.kind.as_str(),
            &instructions,
        );
        RewriteResult {
            original_text: request.text,
            rewritten_text,
            original_score,
            rewritten_score,
            provider: self.kind,
            instructions,
            delta_report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{CompletionConfig, CompletionResponse, ProviderError, TokenUsage};
    use crate::stream::StreamEvent;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    struct ScriptedProvider {
        responses: Mutex<VecDeque<&'static str>>,
        calls: Mutex<usize>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<&'static str>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> usize {
            *self.calls.lock()
        }

        fn next(&self) -> CompletionResponse {
            *self.calls.lock() += 1;
            let content = self
                .responses
                .lock()
                .pop_front()
                .expect("more calls than scripted responses");
            CompletionResponse {
                content: content.to_string(),
                usage: TokenUsage::default(),
                model: "scripted".to_string(),
                stop_reason: Some("stop".to_string()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            Ok(self.next())
        }

        async fn complete_stream(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
            tx: mpsc::Sender<StreamEvent>,
            _cancel: CancellationToken,
        ) -> Result<CompletionResponse, ProviderError> {
            let response = self.next();
            let _ = tx.send(StreamEvent::delta(response.content.clone())).await;
            Ok(response)
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn quick_config() -> RuntimeConfig {
        RuntimeConfig {
            chunk_delay: Duration::from_millis(1),
            ..RuntimeConfig::quick()
        }
    }

    #[tokio::test]
    async fn rewrite_reports_improvement_delta() {
        // Quick mode: one scoring call per evaluation plus the rewrite call.
        let provider = Arc::new(ScriptedProvider::new(vec![
            "FINAL SCORE: 70/100",
            "Here's a rewrite of your text:\nThe argument, restated with explicit scaffolding.",
            "FINAL SCORE: 85/100",
        ]));
        let orchestrator =
            RewriteOrchestrator::new(provider.clone(), ProviderKind::Anthropic, quick_config());

        let result = orchestrator
            .rewrite(RewriteRequest::new("The argument as originally stated."))
            .await
            .unwrap();

        assert_eq!(provider.call_count(), 3);
        assert_eq!(result.original_score, 70);
        assert_eq!(result.rewritten_score, 85);
        assert_eq!(
            result.rewritten_text,
            "The argument, restated with explicit scaffolding."
        );
        assert!(result.delta_report.contains("+15 points (improvement)"));
        assert_eq!(result.instructions, DEFAULT_INSTRUCTIONS_NOTE);
    }

    #[tokio::test]
    async fn custom_instructions_are_recorded() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            "FINAL SCORE: 60/100",
            "Tighter text.",
            "FINAL SCORE: 60/100",
        ]));
        let orchestrator =
            RewriteOrchestrator::new(provider, ProviderKind::OpenAi, quick_config());

        let result = orchestrator
            .rewrite(RewriteRequest::new("Loose text.").with_instructions("Keep it terse."))
            .await
            .unwrap();

        assert_eq!(result.instructions, "Keep it terse.");
        assert!(result.delta_report.contains("0 points (no change)"));
    }

    #[tokio::test]
    async fn empty_text_fails_before_any_call() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let orchestrator =
            RewriteOrchestrator::new(provider.clone(), ProviderKind::DeepSeek, quick_config());

        let err = orchestrator
            .rewrite(RewriteRequest::new("   "))
            .await
            .unwrap_err();

        assert!(matches!(err, RuntimeError::Validation(_)));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn chunked_rewrite_processes_in_order() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            "First chunk, improved.",
            "Second chunk, improved.",
        ]));
        let orchestrator =
            RewriteOrchestrator::new(provider.clone(), ProviderKind::Anthropic, quick_config());

        let chunks = vec!["First chunk.".to_string(), "Second chunk.".to_string()];
        let rewritten = orchestrator.rewrite_chunks(&chunks, None).await.unwrap();

        assert_eq!(
            rewritten,
            vec!["First chunk, improved.", "Second chunk, improved."]
        );
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn streaming_rewrite_streams_chunks_then_completes() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            "FINAL SCORE: 70/100",
            "Restated with scaffolding.",
            "FINAL SCORE: 85/100",
        ]));
        let orchestrator =
            RewriteOrchestrator::new(provider, ProviderKind::Anthropic, quick_config());
        let relay = StreamingRelay::new();

        let mut events = Vec::new();
        let mut sink = |event: StreamEvent| events.push(event);
        let result = orchestrator
            .rewrite_streaming(RewriteRequest::new("Original."), &relay, &mut sink)
            .await
            .unwrap();

        assert_eq!(result.rewritten_score, 85);
        assert_eq!(events[0], StreamEvent::delta("Restated with scaffolding."));
        assert_eq!(
            events.last().unwrap(),
            &StreamEvent::Completed {
                final_score: Some(85)
            }
        );
    }
}

//! The multi-phase evaluation protocol engine.
//!
//! A run is a strictly sequential state machine over up to four provider
//! round-trips: initial evaluation, conditional pushback, consistency
//! check, final validation. Each phase's prompt depends on the previous
//! phase's extracted score, so there is no phase-level concurrency. Any
//! provider failure aborts the whole run; there are no retries and no
//! partial results.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use candor_core::prompts::{self, PUSHBACK_SKIPPED_NOTE};
use candor_core::report;
use candor_core::score::{extract_score, Score};
use candor_core::{
    EvaluationRequest, PhaseId, PhaseResult, ProtocolMode, ProtocolResult, ValidationError,
};

use crate::config::RuntimeConfig;
use crate::providers::{ChatMessage, LlmProvider, ProviderError};
use crate::stream::{EventSink, StreamEvent, StreamingRelay};
use crate::usage::{LlmUsage, UsageMeter};

/// Errors from protocol runs and orchestrators.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Phase {phase:?} provider call failed: {source}")]
    PhaseFailed {
        phase: PhaseId,
        #[source]
        source: ProviderError,
    },

    #[error("Provider call failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Run cancelled")]
    Cancelled,
}

/// Drives the evaluation protocol against one provider.
///
/// Engines are stateless between runs apart from the usage meter; a single
/// engine can serve concurrent runs (the comparison runner does exactly
/// that).
pub struct ProtocolEngine {
    provider: Arc<dyn LlmProvider>,
    config: RuntimeConfig,
    meter: Arc<UsageMeter>,
}

impl ProtocolEngine {
    pub fn new(provider: Arc<dyn LlmProvider>, config: RuntimeConfig) -> Self {
        Self {
            provider,
            config,
            meter: Arc::new(UsageMeter::new()),
        }
    }

    /// An engine that accumulates usage into a shared meter.
    pub fn with_meter(
        provider: Arc<dyn LlmProvider>,
        config: RuntimeConfig,
        meter: Arc<UsageMeter>,
    ) -> Self {
        Self {
            provider,
            config,
            meter,
        }
    }

    /// Usage accumulated by this engine so far.
    pub fn usage(&self) -> LlmUsage {
        self.meter.snapshot()
    }

    /// Execute the configured protocol on a request.
    pub async fn run(&self, request: &EvaluationRequest) -> Result<ProtocolResult, RuntimeError> {
        match self.config.mode {
            ProtocolMode::Normal => self.run_normal(request).await,
            ProtocolMode::Comprehensive => self.run_comprehensive(request).await,
        }
    }

    /// Execute the configured protocol, forwarding stream events as phases
    /// progress. Deltas arrive through the relay in provider order; phase
    /// boundaries and extracted scores are interleaved as typed events.
    pub async fn run_streaming(
        &self,
        request: &EvaluationRequest,
        relay: &StreamingRelay,
        sink: EventSink<'_>,
    ) -> Result<ProtocolResult, RuntimeError> {
        let result = match self.config.mode {
            ProtocolMode::Normal => self.stream_normal(request, relay, &mut *sink).await?,
            ProtocolMode::Comprehensive => {
                self.stream_comprehensive(request, relay, &mut *sink).await?
            }
        };
        relay.complete(&mut *sink, Some(result.final_score));
        Ok(result)
    }

    async fn run_normal(&self, request: &EvaluationRequest) -> Result<ProtocolResult, RuntimeError> {
        let prompt = prompts::phase1_prompt(&request.text, request.evaluation_type);
        let raw = self
            .call(PhaseId::InitialEvaluation, vec![ChatMessage::user(&prompt)])
            .await?;
        let score = extract_score(&raw);
        tracing::info!(score = score.value, "quick evaluation complete");

        let phases = vec![phase_record(PhaseId::InitialEvaluation, prompt, &raw, score)];
        Ok(self.assemble(request, phases, score.value))
    }

    async fn run_comprehensive(
        &self,
        request: &EvaluationRequest,
    ) -> Result<ProtocolResult, RuntimeError> {
        let mut phases = Vec::with_capacity(4);

        // Phase 1: initial evaluation.
        let p1_prompt = prompts::phase1_prompt(&request.text, request.evaluation_type);
        let p1_raw = self
            .call(
                PhaseId::InitialEvaluation,
                vec![ChatMessage::user(&p1_prompt)],
            )
            .await?;
        let s1 = extract_score(&p1_raw);
        phases.push(phase_record(
            PhaseId::InitialEvaluation,
            p1_prompt.clone(),
            &p1_raw,
            s1,
        ));

        // Phase 2: pushback, only when the initial score falls short.
        let s2 = if s1.value < self.config.pushback_threshold {
            let p2_prompt = prompts::phase2_prompt(s1.value, &request.text, request.evaluation_type);
            let messages = if self.config.carry_history {
                vec![
                    ChatMessage::user(&p1_prompt),
                    ChatMessage::assistant(&p1_raw),
                    ChatMessage::user(&p2_prompt),
                ]
            } else {
                vec![ChatMessage::user(&p2_prompt)]
            };
            let p2_raw = self.call(PhaseId::Pushback, messages).await?;
            let s2 = extract_score(&p2_raw);
            tracing::info!(from = s1.value, to = s2.value, "pushback revised score");
            phases.push(phase_record(PhaseId::Pushback, p2_prompt, &p2_raw, s2));
            s2
        } else {
            tracing::info!(score = s1.value, "pushback skipped");
            phases.push(PhaseResult {
                phase: PhaseId::Pushback,
                prompt: String::new(),
                response: PUSHBACK_SKIPPED_NOTE.to_string(),
                score: s1,
                invoked: false,
            });
            s1
        };

        // Phase 3: consistency check against the outperform figure.
        let p3_prompt = prompts::phase3_prompt(s2.value);
        let p3_raw = self
            .call(
                PhaseId::ConsistencyCheck,
                vec![ChatMessage::user(&p3_prompt)],
            )
            .await?;
        let s3 = extract_score(&p3_raw);
        phases.push(phase_record(PhaseId::ConsistencyCheck, p3_prompt, &p3_raw, s3));

        // Phase 4: final validation.
        let p4_prompt = prompts::phase4_prompt();
        let p4_raw = self
            .call(
                PhaseId::FinalValidation,
                vec![ChatMessage::user(&p4_prompt)],
            )
            .await?;
        let s4 = extract_score(&p4_raw);
        phases.push(phase_record(PhaseId::FinalValidation, p4_prompt, &p4_raw, s4));

        let final_score = select_final_score(s1, s2, s3, s4);
        Ok(self.assemble(request, phases, final_score))
    }

    async fn stream_normal(
        &self,
        request: &EvaluationRequest,
        relay: &StreamingRelay,
        sink: EventSink<'_>,
    ) -> Result<ProtocolResult, RuntimeError> {
        let prompt = prompts::phase1_prompt(&request.text, request.evaluation_type);
        let (raw, score) = self
            .stream_phase(
                PhaseId::InitialEvaluation,
                vec![ChatMessage::user(&prompt)],
                relay,
                &mut *sink,
            )
            .await?;
        let phases = vec![phase_record(PhaseId::InitialEvaluation, prompt, &raw, score)];
        Ok(self.assemble(request, phases, score.value))
    }

    async fn stream_comprehensive(
        &self,
        request: &EvaluationRequest,
        relay: &StreamingRelay,
        sink: EventSink<'_>,
    ) -> Result<ProtocolResult, RuntimeError> {
        let mut phases = Vec::with_capacity(4);

        let p1_prompt = prompts::phase1_prompt(&request.text, request.evaluation_type);
        let (p1_raw, s1) = self
            .stream_phase(
                PhaseId::InitialEvaluation,
                vec![ChatMessage::user(&p1_prompt)],
                relay,
                &mut *sink,
            )
            .await?;
        phases.push(phase_record(
            PhaseId::InitialEvaluation,
            p1_prompt.clone(),
            &p1_raw,
            s1,
        ));

        let s2 = if s1.value < self.config.pushback_threshold {
            let p2_prompt = prompts::phase2_prompt(s1.value, &request.text, request.evaluation_type);
            let messages = if self.config.carry_history {
                vec![
                    ChatMessage::user(&p1_prompt),
                    ChatMessage::assistant(&p1_raw),
                    ChatMessage::user(&p2_prompt),
                ]
            } else {
                vec![ChatMessage::user(&p2_prompt)]
            };
            let (p2_raw, s2) = self
                .stream_phase(PhaseId::Pushback, messages, relay, &mut *sink)
                .await?;
            phases.push(phase_record(PhaseId::Pushback, p2_prompt, &p2_raw, s2));
            s2
        } else {
            phases.push(PhaseResult {
                phase: PhaseId::Pushback,
                prompt: String::new(),
                response: PUSHBACK_SKIPPED_NOTE.to_string(),
                score: s1,
                invoked: false,
            });
            s1
        };

        let p3_prompt = prompts::phase3_prompt(s2.value);
        let (p3_raw, s3) = self
            .stream_phase(
                PhaseId::ConsistencyCheck,
                vec![ChatMessage::user(&p3_prompt)],
                relay,
                &mut *sink,
            )
            .await?;
        phases.push(phase_record(PhaseId::ConsistencyCheck, p3_prompt, &p3_raw, s3));

        let p4_prompt = prompts::phase4_prompt();
        let (p4_raw, s4) = self
            .stream_phase(
                PhaseId::FinalValidation,
                vec![ChatMessage::user(&p4_prompt)],
                relay,
                &mut *sink,
            )
            .await?;
        phases.push(phase_record(PhaseId::FinalValidation, p4_prompt, &p4_raw, s4));

        let final_score = select_final_score(s1, s2, s3, s4);
        Ok(self.assemble(request, phases, final_score))
    }

    /// One buffered provider round-trip, with usage accounting.
    async fn call(
        &self,
        phase: PhaseId,
        messages: Vec<ChatMessage>,
    ) -> Result<String, RuntimeError> {
        tracing::info!(
            phase = phase.number(),
            provider = self.provider.name(),
            "running phase"
        );
        let response = self
            .provider
            .complete(messages, &self.config.completion_config())
            .await
            .map_err(|source| RuntimeError::PhaseFailed { phase, source })?;
        self.meter.record(&response.usage);
        Ok(response.content)
    }

    /// One streaming provider round-trip through the relay.
    async fn stream_phase(
        &self,
        phase: PhaseId,
        messages: Vec<ChatMessage>,
        relay: &StreamingRelay,
        sink: EventSink<'_>,
    ) -> Result<(String, Score), RuntimeError> {
        sink(StreamEvent::PhaseStarted {
            phase: phase.number(),
            label: phase.label().to_string(),
        });

        let response = relay
            .forward(
                self.provider.clone(),
                messages,
                self.config.completion_config(),
                &mut *sink,
            )
            .await
            .map_err(|source| RuntimeError::PhaseFailed { phase, source })?;

        if relay.is_cancelled() {
            return Err(RuntimeError::Cancelled);
        }

        self.meter.record(&response.usage);
        let score = extract_score(&response.content);
        sink(StreamEvent::ScoreExtracted {
            phase: phase.number(),
            score: score.value,
        });
        Ok((response.content, score))
    }

    fn assemble(
        &self,
        request: &EvaluationRequest,
        phases: Vec<PhaseResult>,
        final_score: u8,
    ) -> ProtocolResult {
        let formatted_report = report::protocol_report(
            request.evaluation_type,
            self.config.mode,
            &phases,
            final_score,
        );
        ProtocolResult {
            phases,
            final_score,
            formatted_report,
            provider: request.provider,
            evaluation_type: request.evaluation_type,
            evaluated_at: Utc::now(),
        }
    }
}

fn phase_record(phase: PhaseId, prompt: String, raw: &str, score: Score) -> PhaseResult {
    PhaseResult {
        phase,
        prompt,
        response: report::clean_response(raw),
        score,
        invoked: true,
    }
}

/// Phase 4's restated score wins when it was genuinely extracted;
/// otherwise fall back to the best score seen across the earlier phases.
fn select_final_score(s1: Score, s2: Score, s3: Score, s4: Score) -> u8 {
    if s4.is_extracted() {
        s4.value
    } else {
        s1.value.max(s2.value).max(s3.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{CompletionConfig, CompletionResponse, TokenUsage};
    use async_trait::async_trait;
    use candor_core::score::ScoreOrigin;
    use candor_core::{EvaluationType, ProviderKind};
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    /// Pops one scripted response per call and records the request messages.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<&'static str>>,
        calls: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<&'static str>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }

        fn call_messages(&self, index: usize) -> Vec<ChatMessage> {
            self.calls.lock()[index].clone()
        }

        fn next_response(&self, messages: Vec<ChatMessage>) -> Result<CompletionResponse, ProviderError> {
            self.calls.lock().push(messages);
            let content = self
                .responses
                .lock()
                .pop_front()
                .expect("more calls than scripted responses");
            Ok(CompletionResponse {
                content: content.to_string(),
                usage: TokenUsage {
                    prompt_tokens: 100,
                    completion_tokens: 50,
                },
                model: "scripted".to_string(),
                stop_reason: Some("stop".to_string()),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(
            &self,
            messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            self.next_response(messages)
        }

        async fn complete_stream(
            &self,
            messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
            tx: mpsc::Sender<StreamEvent>,
            _cancel: CancellationToken,
        ) -> Result<CompletionResponse, ProviderError> {
            let response = self.next_response(messages)?;
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

    struct FailingProvider;

    #[async_trait]
    impl LlmProvider for FailingProvider {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            Err(ProviderError::ApiError {
                status: 500,
                message: "upstream unavailable".to_string(),
            })
        }

        async fn complete_stream(
            &self,
            messages: Vec<ChatMessage>,
            config: &CompletionConfig,
            _tx: mpsc::Sender<StreamEvent>,
            _cancel: CancellationToken,
        ) -> Result<CompletionResponse, ProviderError> {
            self.complete(messages, config).await
        }

        async fn health_check(&self) -> bool {
            false
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn request() -> EvaluationRequest {
        EvaluationRequest::new(
            "The concept of a red object presupposes the concept of an extended object.",
            ProviderKind::Anthropic,
            EvaluationType::Intelligence,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn high_initial_score_skips_pushback() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            "FINAL SCORE: 96/100",
            "Consistent with the figure. FINAL SCORE: 97/100",
            "Confirmed. FINAL SCORE: 96/100",
        ]));
        let engine = ProtocolEngine::new(provider.clone(), RuntimeConfig::default());

        let result = engine.run(&request()).await.unwrap();

        // Three provider calls: pushback never went out.
        assert_eq!(provider.call_count(), 3);
        let pushback = &result.phases[1];
        assert_eq!(pushback.phase, PhaseId::Pushback);
        assert!(!pushback.invoked);
        assert_eq!(pushback.response, PUSHBACK_SKIPPED_NOTE);
        assert_eq!(pushback.score.value, 96);
        assert_eq!(result.final_score, 96);
    }

    #[tokio::test]
    async fn low_initial_score_triggers_pushback_once() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            "FINAL SCORE: 80/100",
            "Revised upward. FINAL SCORE: 88/100",
            "The figure holds. FINAL SCORE: 90/100",
            "The assessment stands as given.",
        ]));
        let engine = ProtocolEngine::new(provider.clone(), RuntimeConfig::default());

        let result = engine.run(&request()).await.unwrap();

        assert_eq!(provider.call_count(), 4);

        // The pushback prompt embeds the literal outperform figure.
        let pushback_messages = provider.call_messages(1);
        assert_eq!(pushback_messages.len(), 1);
        assert!(pushback_messages[0]
            .content
            .contains("20/100 OUTPERFORM THE AUTHOR"));

        // Phase 4 produced no score, so the best earlier score wins.
        assert_eq!(result.phases[3].score.origin, ScoreOrigin::Fallback);
        assert_eq!(result.final_score, 90);
    }

    #[tokio::test]
    async fn extracted_phase4_score_is_final() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            "FINAL SCORE: 80/100",
            "FINAL SCORE: 88/100",
            "FINAL SCORE: 90/100",
            "On reflection. FINAL SCORE: 89/100",
        ]));
        let engine = ProtocolEngine::new(provider, RuntimeConfig::default());

        let result = engine.run(&request()).await.unwrap();
        assert_eq!(result.final_score, 89);
    }

    #[tokio::test]
    async fn normal_mode_runs_single_phase() {
        let provider = Arc::new(ScriptedProvider::new(vec!["FINAL SCORE: 82/100"]));
        let engine = ProtocolEngine::new(provider.clone(), RuntimeConfig::quick());

        let result = engine.run(&request()).await.unwrap();

        assert_eq!(provider.call_count(), 1);
        assert_eq!(result.phases.len(), 1);
        assert_eq!(result.final_score, 82);
        assert!(result
            .formatted_report
            .starts_with("Quick Intelligence Evaluation"));
    }

    #[tokio::test]
    async fn carry_history_prepends_phase1_exchange() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            "FINAL SCORE: 70/100",
            "FINAL SCORE: 85/100",
            "FINAL SCORE: 85/100",
            "FINAL SCORE: 85/100",
        ]));
        let config = RuntimeConfig {
            carry_history: true,
            ..RuntimeConfig::default()
        };
        let engine = ProtocolEngine::new(provider.clone(), config);

        engine.run(&request()).await.unwrap();

        let pushback_messages = provider.call_messages(1);
        assert_eq!(pushback_messages.len(), 3);
        assert_eq!(pushback_messages[0].role, "user");
        assert_eq!(pushback_messages[1].role, "assistant");
        assert_eq!(pushback_messages[1].content, "FINAL SCORE: 70/100");
        assert_eq!(pushback_messages[2].role, "user");
    }

    #[tokio::test]
    async fn provider_failure_aborts_run() {
        let engine = ProtocolEngine::new(Arc::new(FailingProvider), RuntimeConfig::default());
        let err = engine.run(&request()).await.unwrap_err();
        match err {
            RuntimeError::PhaseFailed { phase, .. } => {
                assert_eq!(phase, PhaseId::InitialEvaluation);
            }
            other => panic!("expected PhaseFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn usage_accumulates_per_call() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            "FINAL SCORE: 96/100",
            "FINAL SCORE: 96/100",
            "FINAL SCORE: 96/100",
        ]));
        let engine = ProtocolEngine::new(provider, RuntimeConfig::default());
        engine.run(&request()).await.unwrap();

        let usage = engine.usage();
        assert_eq!(usage.llm_calls, 3);
        assert_eq!(usage.total_tokens, 450);
    }

    #[tokio::test]
    async fn streaming_run_emits_phase_markers_and_completion() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            "FINAL SCORE: 96/100",
            "FINAL SCORE: 97/100",
            "FINAL SCORE: 96/100",
        ]));
        let engine = ProtocolEngine::new(provider, RuntimeConfig::default());
        let relay = StreamingRelay::new();

        let mut events = Vec::new();
        let mut sink = |event: StreamEvent| events.push(event);
        let result = engine
            .run_streaming(&request(), &relay, &mut sink)
            .await
            .unwrap();

        assert_eq!(result.final_score, 96);
        let phase_starts: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::PhaseStarted { phase, .. } => Some(*phase),
                _ => None,
            })
            .collect();
        // Pushback was skipped, so phase 2 never announced itself.
        assert_eq!(phase_starts, vec![1, 3, 4]);
        assert_eq!(
            events.last().unwrap(),
            &StreamEvent::Completed {
                final_score: Some(96)
            }
        );
    }

    #[tokio::test]
    async fn streaming_failure_surfaces_in_band() {
        let engine = ProtocolEngine::new(Arc::new(FailingProvider), RuntimeConfig::default());
        let relay = StreamingRelay::new();

        let mut events = Vec::new();
        let mut sink = |event: StreamEvent| events.push(event);
        let err = engine
            .run_streaming(&request(), &relay, &mut sink)
            .await
            .unwrap_err();

        assert!(matches!(err, RuntimeError::PhaseFailed { .. }));
        assert!(events
            .iter()
            .any(|e| matches!(e, StreamEvent::Error { .. })));
        assert!(!events
            .iter()
            .any(|e| matches!(e, StreamEvent::Completed { .. })));
    }
}

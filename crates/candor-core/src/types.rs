//! Core request and result types for the evaluation protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::score::Score;

/// Errors raised while validating a request, before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Text is required")]
    EmptyText,

    #[error("Valid provider is required: unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("Unknown evaluation type '{0}'")]
    UnknownEvaluationType(String),
}

/// The dimension a protocol run evaluates.
///
/// Each type selects a different question battery; everything else about
/// the protocol is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationType {
    Intelligence,
    Originality,
    Cogency,
    OverallQuality,
}

impl EvaluationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationType::Intelligence => "intelligence",
            EvaluationType::Originality => "originality",
            EvaluationType::Cogency => "cogency",
            EvaluationType::OverallQuality => "overall_quality",
        }
    }

    /// Human-readable label used in report headers.
    pub fn label(&self) -> &'static str {
        match self {
            EvaluationType::Intelligence => "Intelligence",
            EvaluationType::Originality => "Originality",
            EvaluationType::Cogency => "Cogency",
            EvaluationType::OverallQuality => "Overall Quality",
        }
    }
}

impl Default for EvaluationType {
    fn default() -> Self {
        EvaluationType::Intelligence
    }
}

impl FromStr for EvaluationType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "intelligence" => Ok(EvaluationType::Intelligence),
            "originality" => Ok(EvaluationType::Originality),
            "cogency" => Ok(EvaluationType::Cogency),
            "overall_quality" => Ok(EvaluationType::OverallQuality),
            other => Err(ValidationError::UnknownEvaluationType(other.to_string())),
        }
    }
}

impl fmt::Display for EvaluationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which vendor backend a run is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Perplexity,
    DeepSeek,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Perplexity,
        ProviderKind::DeepSeek,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Perplexity => "perplexity",
            ProviderKind::DeepSeek => "deepseek",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "perplexity" => Ok(ProviderKind::Perplexity),
            "deepseek" => Ok(ProviderKind::DeepSeek),
            other => Err(ValidationError::UnknownProvider(other.to_string())),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much of the protocol a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolMode {
    /// Phase 1 only, for low-latency quick evaluations.
    Normal,
    /// The full four-phase protocol.
    Comprehensive,
}

impl Default for ProtocolMode {
    fn default() -> Self {
        ProtocolMode::Comprehensive
    }
}

/// An immutable evaluation request.
///
/// Construction validates the text so that bad input is rejected before
/// any provider call is made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub text: String,
    pub provider: ProviderKind,
    pub evaluation_type: EvaluationType,
}

impl EvaluationRequest {
    pub fn new(
        text: impl Into<String>,
        provider: ProviderKind,
        evaluation_type: EvaluationType,
    ) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }
        Ok(Self {
            text,
            provider,
            evaluation_type,
        })
    }
}

/// Identifies one round-trip within a protocol run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseId {
    InitialEvaluation,
    Pushback,
    ConsistencyCheck,
    FinalValidation,
}

impl PhaseId {
    pub fn number(&self) -> u8 {
        match self {
            PhaseId::InitialEvaluation => 1,
            PhaseId::Pushback => 2,
            PhaseId::ConsistencyCheck => 3,
            PhaseId::FinalValidation => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PhaseId::InitialEvaluation => "Initial Questions and Assessment",
            PhaseId::Pushback => "Pushback Analysis",
            PhaseId::ConsistencyCheck => "Walmart Metric Consistency Check",
            PhaseId::FinalValidation => "Final Validation",
        }
    }
}

/// One phase's record in the transcript. Created once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseResult {
    pub phase: PhaseId,
    pub prompt: String,
    /// Cleaned response text (markdown markers stripped).
    pub response: String,
    pub score: Score,
    /// False only for a skipped pushback phase.
    pub invoked: bool,
}

/// The outcome of a full protocol run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolResult {
    /// Ordered transcript, one entry per phase.
    pub phases: Vec<PhaseResult>,
    pub final_score: u8,
    pub formatted_report: String,
    pub provider: ProviderKind,
    pub evaluation_type: EvaluationType,
    pub evaluated_at: DateTime<Utc>,
}

impl ProtocolResult {
    /// The last phase's cleaned response, used as the analysis body of
    /// buffered JSON responses.
    pub fn analysis(&self) -> &str {
        self.phases
            .last()
            .map(|p| p.response.as_str())
            .unwrap_or_default()
    }
}

/// The outcome of a rewrite operation. Returned directly to the caller,
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteResult {
    pub original_text: String,
    pub rewritten_text: String,
    pub original_score: u8,
    pub rewritten_score: u8,
    pub provider: ProviderKind,
    pub instructions: String,
    pub delta_report: String,
}

/// Buffered JSON payload for the evaluation surface.
///
/// The HTTP layer that serves this is an external collaborator; this crate
/// only fixes the shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub analysis: String,
    pub score: u8,
    pub provider: ProviderKind,
    pub evaluation_type: EvaluationType,
}

impl From<&ProtocolResult> for AnalysisResponse {
    fn from(result: &ProtocolResult) -> Self {
        Self {
            analysis: result.analysis().to_string(),
            score: result.final_score,
            provider: result.provider,
            evaluation_type: result.evaluation_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_rejected() {
        let err = EvaluationRequest::new("", ProviderKind::Anthropic, EvaluationType::Intelligence)
            .unwrap_err();
        assert_eq!(err, ValidationError::EmptyText);

        let err = EvaluationRequest::new(
            "   \n\t ",
            ProviderKind::OpenAi,
            EvaluationType::Cogency,
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::EmptyText);
    }

    #[test]
    fn non_empty_text_is_accepted() {
        let request = EvaluationRequest::new(
            "One cannot have the concept of a red object without the concept of an extended object.",
            ProviderKind::DeepSeek,
            EvaluationType::Intelligence,
        )
        .unwrap();
        assert_eq!(request.provider, ProviderKind::DeepSeek);
    }

    #[test]
    fn provider_round_trip() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.as_str().parse::<ProviderKind>().unwrap(), kind);
        }
        assert!("gemini".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn evaluation_type_round_trip() {
        for s in ["intelligence", "originality", "cogency", "overall_quality"] {
            let t: EvaluationType = s.parse().unwrap();
            assert_eq!(t.as_str(), s);
        }
        assert!("vibes".parse::<EvaluationType>().is_err());
    }

    #[test]
    fn analysis_response_serializes_camel_case() {
        let response = AnalysisResponse {
            analysis: "solid work".to_string(),
            score: 88,
            provider: ProviderKind::Anthropic,
            evaluation_type: EvaluationType::OverallQuality,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["score"], 88);
        assert_eq!(json["provider"], "anthropic");
        assert_eq!(json["evaluationType"], "overall_quality");
    }
}

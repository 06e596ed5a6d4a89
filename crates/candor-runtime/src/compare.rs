//! Two-document comparison.
//!
//! The two protocol runs share no mutable state, so they execute
//! concurrently. This is the only parallelism in the system; phases within
//! each run remain strictly sequential.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use candor_core::{EvaluationRequest, EvaluationType, ProtocolResult, ProviderKind};

use crate::config::RuntimeConfig;
use crate::engine::{ProtocolEngine, RuntimeError};
use crate::providers::LlmProvider;
use crate::usage::{LlmUsage, UsageMeter};

/// Which document the comparison favors. Ties go to A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    A,
    B,
}

impl Winner {
    pub fn label(&self) -> &'static str {
        match self {
            Winner::A => "A",
            Winner::B => "B",
        }
    }
}

/// Report-derived notes about one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInsights {
    pub score: u8,
    pub strengths: Vec<String>,
    pub style: Vec<String>,
}

/// The outcome of comparing two documents with the same provider and
/// evaluation type.
#[derive(Debug)]
pub struct ComparisonOutcome {
    pub analysis_a: ProtocolResult,
    pub analysis_b: ProtocolResult,
    pub insights_a: DocumentInsights,
    pub insights_b: DocumentInsights,
    pub winner: Winner,
    pub final_judgment: String,
    pub usage: LlmUsage,
}

/// Runs the protocol on two documents concurrently and synthesizes a
/// comparison.
pub struct ComparisonRunner {
    provider: Arc<dyn LlmProvider>,
    kind: ProviderKind,
    config: RuntimeConfig,
}

impl ComparisonRunner {
    pub fn new(provider: Arc<dyn LlmProvider>, kind: ProviderKind, config: RuntimeConfig) -> Self {
        Self {
            provider,
            kind,
            config,
        }
    }

    pub async fn compare(
        &self,
        text_a: &str,
        text_b: &str,
        evaluation_type: EvaluationType,
    ) -> Result<ComparisonOutcome, RuntimeError> {
        let request_a = EvaluationRequest::new(text_a, self.kind, evaluation_type)?;
        let request_b = EvaluationRequest::new(text_b, self.kind, evaluation_type)?;

        let meter = Arc::new(UsageMeter::new());
        let engine =
            ProtocolEngine::with_meter(self.provider.clone(), self.config.clone(), meter.clone());

        tracing::info!(provider = self.kind.as_str(), "comparing two documents");
        let (result_a, result_b) = tokio::join!(engine.run(&request_a), engine.run(&request_b));
        let analysis_a = result_a?;
        let analysis_b = result_b?;

        let winner = if analysis_a.final_score >= analysis_b.final_score {
            Winner::A
        } else {
            Winner::B
        };

        let insights_a = derive_insights(&analysis_a);
        let insights_b = derive_insights(&analysis_b);

        let (winning, losing) = match winner {
            Winner::A => (analysis_a.final_score, analysis_b.final_score),
            Winner::B => (analysis_b.final_score, analysis_a.final_score),
        };
        let final_judgment = format!(
            "While both authors demonstrate real intellectual capability, Document {w} \
             exhibits the stronger cognitive profile, scoring {winning}/100 against \
             {losing}/100. The author of Document {w} engages the conceptual problems \
             more directly and sustains a tighter argumentative structure, which makes \
             Document {w} the winner in this comparison.",
            w = winner.label(),
        );

        Ok(ComparisonOutcome {
            analysis_a,
            analysis_b,
            insights_a,
            insights_b,
            winner,
            final_judgment,
            usage: meter.snapshot(),
        })
    }
}

/// Surface strengths and style notes from a report by keyword presence.
fn derive_insights(analysis: &ProtocolResult) -> DocumentInsights {
    let report = analysis.formatted_report.to_lowercase();

    let strength_markers: [(&str, &str); 5] = [
        ("insightful", "Demonstrates genuine insight"),
        ("develop", "Develops points effectively"),
        ("hierarchical", "Hierarchical organization"),
        ("fresh", "Fresh perspectives"),
        ("organic", "Organic development"),
    ];
    let mut strengths: Vec<String> = strength_markers
        .iter()
        .filter(|(marker, _)| report.contains(marker))
        .map(|(_, note)| note.to_string())
        .collect();
    if strengths.is_empty() {
        strengths.push("Cognitive capacity demonstrated".to_string());
    }

    let style_markers: [(&str, &str); 3] = [
        ("direct", "Direct expression"),
        ("logical", "Logical structure"),
        ("coherent", "Coherent flow"),
    ];
    let mut style: Vec<String> = style_markers
        .iter()
        .filter(|(marker, _)| report.contains(marker))
        .map(|(_, note)| note.to_string())
        .collect();
    if style.is_empty() {
        style.push("Analytical approach".to_string());
    }

    DocumentInsights {
        score: analysis.final_score,
        strengths,
        style,
    }
}

//! # candor-core
//!
//! Deterministic primitives for the candor evaluation protocol.
//!
//! This crate holds everything about the multi-phase scoring protocol that
//! does not touch the network: request/result types, the question
//! batteries and phase prompt templates, score extraction from free-text
//! responses, and report formatting. Same input always produces the same
//! output; no LLM calls are made here.
//!
//! The async provider adapters and the protocol engine that drives them
//! live in `candor-runtime`.

pub mod prompts;
pub mod questions;
pub mod report;
pub mod score;
pub mod types;

pub use score::{extract_score, Score, ScoreOrigin, FALLBACK_SCORE};
pub use types::{
    AnalysisResponse, EvaluationRequest, EvaluationType, PhaseId, PhaseResult, ProtocolMode,
    ProtocolResult, ProviderKind, RewriteResult, ValidationError,
};

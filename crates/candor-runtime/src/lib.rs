//! # candor-runtime
//!
//! Async runtime for the candor evaluation protocol: vendor provider
//! adapters, the streaming relay, the multi-phase protocol engine, and the
//! rewrite and comparison orchestrators.
//!
//! The deterministic pieces (prompt templates, score extraction, report
//! formatting) live in `candor-core`; this crate adds the network and
//! control flow around them.
//!
//! ## Example
//!
//! ```rust,ignore
//! use candor_core::{EvaluationRequest, EvaluationType, ProviderKind};
//! use candor_runtime::{ProtocolEngine, ProviderRegistry, RuntimeConfig};
//!
//! let registry = ProviderRegistry::with_defaults();
//! let provider = registry.create_kind(ProviderKind::Anthropic, &serde_json::json!({}))?;
//!
//! let request = EvaluationRequest::new(text, ProviderKind::Anthropic, EvaluationType::Intelligence)?;
//! let engine = ProtocolEngine::new(provider, RuntimeConfig::default());
//! let result = engine.run(&request).await?;
//! println!("{}", result.formatted_report);
//! ```

pub mod compare;
pub mod config;
pub mod engine;
pub mod providers;
pub mod rewrite;
pub mod stream;
pub mod usage;

pub use compare::{ComparisonOutcome, ComparisonRunner, DocumentInsights, Winner};
pub use config::RuntimeConfig;
pub use engine::{ProtocolEngine, RuntimeError};
pub use providers::{
    ApiCredential, ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError,
    ProviderFactory, ProviderRegistry, TokenUsage,
};
pub use rewrite::{RewriteOrchestrator, RewriteRequest};
pub use stream::{render_plain, EventSink, StreamEvent, StreamingRelay};
pub use usage::{LlmUsage, UsageMeter};

//! Runtime configuration for engines and orchestrators.

use candor_core::ProtocolMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::providers::CompletionConfig;

/// Serde adapter for humantime duration strings ("120s", "500ms").
mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

/// Configuration for protocol runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Full protocol or phase-1-only quick evaluation.
    pub mode: ProtocolMode,

    /// Pushback runs only when the initial score is below this.
    pub pushback_threshold: u8,

    /// Sampling temperature for every phase.
    pub temperature: f32,

    /// Max tokens per provider call.
    pub max_tokens: u32,

    /// Model override passed to the provider; `None` uses its default.
    pub model: Option<String>,

    /// Per-call request timeout.
    #[serde(with = "humantime_duration")]
    pub request_timeout: Duration,

    /// Courtesy pause between sequential calls in chunked operations.
    #[serde(with = "humantime_duration")]
    pub chunk_delay: Duration,

    /// Carry the phase-1 exchange as conversation history into the
    /// pushback call instead of sending it standalone.
    pub carry_history: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            mode: ProtocolMode::Comprehensive,
            pushback_threshold: 95,
            temperature: 0.1,
            max_tokens: 4000,
            model: None,
            request_timeout: Duration::from_secs(120),
            chunk_delay: Duration::from_millis(500),
            carry_history: false,
        }
    }
}

impl RuntimeConfig {
    /// The per-call completion settings derived from this config.
    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: self.request_timeout,
        }
    }

    pub fn quick() -> Self {
        Self {
            mode: ProtocolMode::Normal,
            ..Self::default()
        }
    }
}

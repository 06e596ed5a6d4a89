//! Token usage accounting.
//!
//! Each protocol run accumulates provider-reported token counts into a
//! meter. Comparison runs share one meter across their two concurrent
//! executions, which is why the interior is a lock rather than plain
//! fields.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::providers::TokenUsage;

/// Accumulated LLM usage for one or more runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmUsage {
    pub total_tokens: u32,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    /// Number of provider calls made.
    pub llm_calls: u32,
}

impl LlmUsage {
    pub fn add(&mut self, usage: &TokenUsage) {
        self.prompt_tokens += usage.prompt_tokens;
        self.completion_tokens += usage.completion_tokens;
        self.total_tokens += usage.total();
        self.llm_calls += 1;
    }
}

/// Thread-safe usage accumulator.
#[derive(Debug, Default)]
pub struct UsageMeter {
    inner: Mutex<LlmUsage>,
}

impl UsageMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, usage: &TokenUsage) {
        self.inner.lock().add(usage);
    }

    pub fn snapshot(&self) -> LlmUsage {
        self.inner.lock().clone()
    }

    pub fn reset(&self) {
        *self.inner.lock() = LlmUsage::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meter_accumulates_across_calls() {
        let meter = UsageMeter::new();
        meter.record(&TokenUsage {
            prompt_tokens: 100,
            completion_tokens: 50,
        });
        meter.record(&TokenUsage {
            prompt_tokens: 200,
            completion_tokens: 80,
        });

        let usage = meter.snapshot();
        assert_eq!(usage.llm_calls, 2);
        assert_eq!(usage.prompt_tokens, 300);
        assert_eq!(usage.completion_tokens, 130);
        assert_eq!(usage.total_tokens, 430);
    }

    #[test]
    fn reset_clears_counts() {
        let meter = UsageMeter::new();
        meter.record(&TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 5,
        });
        meter.reset();
        assert_eq!(meter.snapshot(), LlmUsage::default());
    }
}

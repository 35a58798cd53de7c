//! Core types for generation requests and responses.

use serde::{Deserialize, Serialize};

/// A request to the language model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    /// System prompt (world, character, mood guide, rules).
    pub system: String,
    /// User prompt (history and the player's line).
    pub user: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Temperature (0.0 = deterministic, 1.0 = creative).
    pub temperature: f32,
    /// Per-attempt HTTP timeout in milliseconds.
    pub timeout_ms: u64,
}

impl GenerationRequest {
    /// Create a request with dialogue defaults (150 tokens, temperature 0.7).
    #[must_use]
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens: 150,
            temperature: 0.7,
            timeout_ms: 10_000,
        }
    }

    /// Set the token limit.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// System and user prompt as one text, for single-prompt backends.
    #[must_use]
    pub fn prompt(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }
}

/// A response from the language model.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationResponse {
    /// The generated text, untrimmed.
    pub text: String,
    /// How many tokens were generated.
    pub tokens_generated: u32,
    /// Latency of the successful attempt in milliseconds.
    pub latency_ms: u64,
    /// Which model answered.
    pub model: String,
}

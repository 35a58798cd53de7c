//! Generation error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors a generation call can end with. None of them is fatal to a batch.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// Credentials were missing or rejected.
    #[error("LLM authentication failed: {0}")]
    Auth(String),

    /// The provider asked us to slow down.
    #[error("LLM rate limit hit: {message}")]
    RateLimit {
        /// Provider's suggested wait, if it sent one.
        retry_after_ms: Option<u64>,
        /// Provider message or status line.
        message: String,
    },

    /// The call did not finish in time.
    #[error("LLM request timed out after {0}ms")]
    Timeout(u64),

    /// Anything else between us and a usable answer.
    #[error("LLM transport failure: {0}")]
    Transport(String),
}

impl GenerationError {
    /// The failure category recorded alongside an interaction.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Auth(_) => FailureKind::Auth,
            Self::RateLimit { .. } => FailureKind::RateLimit,
            Self::Timeout(_) => FailureKind::Timeout,
            Self::Transport(_) => FailureKind::Transport,
        }
    }

    /// Whether trying again could help.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Auth(_))
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GenerationError::Timeout(0)
        } else {
            GenerationError::Transport(err.to_string())
        }
    }
}

/// Failure category, without the details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// See [`GenerationError::Auth`].
    Auth,
    /// See [`GenerationError::RateLimit`].
    RateLimit,
    /// See [`GenerationError::Timeout`].
    Timeout,
    /// See [`GenerationError::Transport`].
    Transport,
}

impl FailureKind {
    /// Snake-case label, as serialized.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::RateLimit => "rate_limit",
            Self::Timeout => "timeout",
            Self::Transport => "transport",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

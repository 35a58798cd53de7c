//! Error types for the Aether core library.

use thiserror::Error;

use crate::types::{NpcId, PlayerId};

/// Top-level error type for all core operations.
#[derive(Error, Debug)]
pub enum AetherError {
    /// One input record could not be turned into a [`crate::Message`].
    ///
    /// Only the offending record is skipped; the rest of the batch proceeds.
    #[error("Malformed input at position {index}: {reason}")]
    MalformedInput {
        /// Position of the record in the raw input.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// An id was referenced that the owning component does not know.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Which kind of entity was looked up ("npc", "player").
        kind: &'static str,
        /// The id that was looked up.
        id: String,
    },

    /// Startup configuration is unusable (empty roster, bad window, ...).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AetherError {
    /// Build a [`AetherError::MalformedInput`] for the record at `index`.
    #[must_use]
    pub fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            index,
            reason: reason.into(),
        }
    }

    /// Build a [`AetherError::NotFound`] for an unknown NPC id.
    #[must_use]
    pub fn npc_not_found(id: &NpcId) -> Self {
        Self::NotFound {
            kind: "npc",
            id: id.to_string(),
        }
    }

    /// Build a [`AetherError::NotFound`] for an unknown player id.
    #[must_use]
    pub fn player_not_found(id: &PlayerId) -> Self {
        Self::NotFound {
            kind: "player",
            id: id.to_string(),
        }
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, AetherError>;

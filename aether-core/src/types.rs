//! Core type definitions shared across the conversation engine.
//!
//! All output-facing types are serializable; the field names match the
//! interaction log format consumed downstream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Identifier of a player as it appears in the input batch.
///
/// Input files may carry numeric or string ids; both are normalised to the
/// textual form so `7` and `"7"` name the same player.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Create a player id from anything string-like.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Stable catalog key of an NPC (e.g. `village_guard`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NpcId(pub String);

impl NpcId {
    /// Create an NPC id from anything string-like.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NpcId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ---------------------------------------------------------------------------
// NPC Personality
// ---------------------------------------------------------------------------

/// Static personality profile of an NPC. Never mutated after registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcPersonality {
    /// Catalog key.
    pub id: NpcId,
    /// Display name used in prompts and records.
    pub name: String,
    /// Occupation / role in the village.
    pub role: String,
    /// Free-text backstory.
    pub background: String,
    /// Speech and behaviour quirks, in the order they should be presented.
    #[serde(default)]
    pub quirks: Vec<String>,
}

impl NpcPersonality {
    /// Create a personality with no quirks.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        role: impl Into<String>,
        background: impl Into<String>,
    ) -> Self {
        Self {
            id: NpcId::new(id),
            name: name.into(),
            role: role.into(),
            background: background.into(),
            quirks: Vec::new(),
        }
    }

    /// Append a quirk.
    #[must_use]
    pub fn with_quirk(mut self, quirk: impl Into<String>) -> Self {
        self.quirks.push(quirk.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// One paired (player message, NPC response) unit of conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    /// What the player said.
    pub player: String,
    /// What the NPC answered.
    pub npc: String,
}

impl Exchange {
    /// Create an exchange pair.
    #[must_use]
    pub fn new(player: impl Into<String>, npc: impl Into<String>) -> Self {
        Self {
            player: player.into(),
            npc: npc.into(),
        }
    }
}

/// A validated input message, ready for scheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Position of this message in the raw input batch.
    pub sequence: usize,
    /// Who sent it.
    pub player_id: PlayerId,
    /// What they said.
    pub text: String,
    /// When they said it.
    pub timestamp: DateTime<Utc>,
}

/// An input record exactly as loaded, before validation.
///
/// Every field is optional and loosely typed so that a single bad record can
/// be reported precisely instead of failing the whole file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Player id: a JSON string or integer.
    #[serde(default)]
    pub player_id: Option<serde_json::Value>,
    /// Message text: a JSON string.
    #[serde(default)]
    pub text: Option<serde_json::Value>,
    /// ISO-8601 timestamp string.
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
}

impl RawMessage {
    /// Create a fully-populated raw record.
    #[must_use]
    pub fn new(
        player_id: impl Into<serde_json::Value>,
        text: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            player_id: Some(player_id.into()),
            text: Some(serde_json::Value::String(text.into())),
            timestamp: Some(serde_json::Value::String(timestamp.into())),
        }
    }
}

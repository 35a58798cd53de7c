//! Interaction records and batch reports.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aether_core::scheduler::Rejection;
use aether_core::{Exchange, Mood, NpcId, PlayerId};
use aether_llm::FailureKind;

/// One processed message: what the player said, who answered, and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Message timestamp.
    pub timestamp: DateTime<Utc>,
    /// Position of the message in the raw input.
    pub sequence: usize,
    /// Speaking player.
    pub player_id: PlayerId,
    /// What the player said.
    pub player_message: String,
    /// NPC bound to the player.
    pub npc_id: NpcId,
    /// NPC display name.
    pub npc_name: String,
    /// NPC role.
    pub npc_role: String,
    /// Mood after this message's transition.
    pub npc_mood: Mood,
    /// Final (normalized or fallback) response.
    pub npc_response: String,
    /// History window as it stood before this exchange.
    pub conversation_history: Vec<Exchange>,
    /// Why generation failed, if it did.
    pub generation_failure: Option<FailureKind>,
}

impl InteractionRecord {
    /// Whether the response is a fallback line.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.generation_failure.is_some()
    }
}

/// Counts for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Records emitted.
    pub processed: usize,
    /// Input entries skipped as malformed.
    pub skipped: usize,
    /// Distinct players seen.
    pub players: usize,
    /// Generation failures by kind.
    pub failures: BTreeMap<FailureKind, usize>,
}

impl BatchSummary {
    /// Total generation failures across kinds.
    #[must_use]
    pub fn total_failures(&self) -> usize {
        self.failures.values().sum()
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "processed={} skipped={} players={} fallbacks={}",
            self.processed,
            self.skipped,
            self.players,
            self.total_failures()
        )?;
        for (kind, count) in &self.failures {
            write!(f, " {kind}={count}")?;
        }
        Ok(())
    }
}

/// Result of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Records in scheduled order.
    pub records: Vec<InteractionRecord>,
    /// Inputs excluded from processing.
    pub skipped: Vec<Rejection>,
}

impl BatchReport {
    /// Aggregate counts for the batch.
    #[must_use]
    pub fn summary(&self) -> BatchSummary {
        let mut failures = BTreeMap::new();
        for kind in self.records.iter().filter_map(|r| r.generation_failure) {
            *failures.entry(kind).or_insert(0) += 1;
        }
        let mut players: Vec<&PlayerId> = self.records.iter().map(|r| &r.player_id).collect();
        players.sort();
        players.dedup();
        BatchSummary {
            processed: self.records.len(),
            skipped: self.skipped.len(),
            players: players.len(),
            failures,
        }
    }
}

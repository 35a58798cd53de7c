//! Conversation State Store — per-player NPC assignment, mood and history.
//!
//! The store exclusively owns every [`PlayerState`]; callers get snapshots.
//! Creation of a player entry runs under the store lock, so a player seen
//! for the first time by two tasks at once is still assigned exactly one NPC.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::error::{AetherError, Result};
use crate::mood::Mood;
use crate::registry::NpcRegistry;
use crate::types::{Exchange, NpcId, PlayerId};

/// Default history window: three exchanges (six messages).
pub const DEFAULT_HISTORY_WINDOW: usize = 3;

/// Conversation state of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerState {
    /// Whose state this is.
    pub player_id: PlayerId,
    /// NPC this player talks to. Fixed at first contact.
    pub assigned_npc_id: NpcId,
    /// NPC's current mood towards this player.
    pub current_mood: Mood,
    history: VecDeque<Exchange>,
    #[serde(skip)]
    window: usize,
}

impl PlayerState {
    fn new(player_id: PlayerId, assigned_npc_id: NpcId, window: usize) -> Self {
        Self {
            player_id,
            assigned_npc_id,
            current_mood: Mood::Neutral,
            history: VecDeque::with_capacity(window),
            window,
        }
    }

    /// Recent exchanges, oldest first. Never longer than the window.
    #[must_use]
    pub fn history(&self) -> &VecDeque<Exchange> {
        &self.history
    }

    /// Owned copy of the history, oldest first.
    #[must_use]
    pub fn history_vec(&self) -> Vec<Exchange> {
        self.history.iter().cloned().collect()
    }

    fn push_exchange(&mut self, exchange: Exchange) {
        while self.history.len() >= self.window {
            self.history.pop_front();
        }
        self.history.push_back(exchange);
    }
}

/// Owner of all player states for one batch run.
#[derive(Debug)]
pub struct ConversationStore {
    registry: Arc<NpcRegistry>,
    window: usize,
    players: Mutex<HashMap<PlayerId, PlayerState>>,
}

impl ConversationStore {
    /// Create a store with the default three-exchange window.
    #[must_use]
    pub fn new(registry: Arc<NpcRegistry>) -> Self {
        Self {
            registry,
            window: DEFAULT_HISTORY_WINDOW,
            players: Mutex::new(HashMap::new()),
        }
    }

    /// Create a store with a custom history window.
    ///
    /// # Errors
    /// Returns `AetherError::Configuration` if `window` is zero.
    pub fn with_window(registry: Arc<NpcRegistry>, window: usize) -> Result<Self> {
        if window == 0 {
            return Err(AetherError::Configuration(
                "history window must hold at least one exchange".into(),
            ));
        }
        Ok(Self {
            window,
            ..Self::new(registry)
        })
    }

    /// Snapshot of a player's state, creating it on first contact.
    ///
    /// A new player is assigned the registry's next NPC, starts
    /// [`Mood::Neutral`] and has an empty history.
    pub fn get_or_create(&self, player_id: &PlayerId) -> PlayerState {
        let mut players = self.players.lock();
        players
            .entry(player_id.clone())
            .or_insert_with(|| {
                let npc = self.registry.assign_next();
                debug!(player = %player_id, npc = %npc, "assigned NPC to new player");
                PlayerState::new(player_id.clone(), npc, self.window)
            })
            .clone()
    }

    /// Snapshot of an existing player's state.
    ///
    /// # Errors
    /// Returns `AetherError::NotFound` for an unknown player.
    pub fn get(&self, player_id: &PlayerId) -> Result<PlayerState> {
        self.players
            .lock()
            .get(player_id)
            .cloned()
            .ok_or_else(|| AetherError::player_not_found(player_id))
    }

    /// Record one exchange, evicting the oldest once the window is full.
    ///
    /// # Errors
    /// Returns `AetherError::NotFound` for an unknown player.
    pub fn append_exchange(
        &self,
        player_id: &PlayerId,
        player_text: impl Into<String>,
        npc_text: impl Into<String>,
    ) -> Result<()> {
        let mut players = self.players.lock();
        let state = players
            .get_mut(player_id)
            .ok_or_else(|| AetherError::player_not_found(player_id))?;
        state.push_exchange(Exchange::new(player_text, npc_text));
        Ok(())
    }

    /// Overwrite a player's current mood.
    ///
    /// # Errors
    /// Returns `AetherError::NotFound` for an unknown player.
    pub fn set_mood(&self, player_id: &PlayerId, mood: Mood) -> Result<()> {
        let mut players = self.players.lock();
        let state = players
            .get_mut(player_id)
            .ok_or_else(|| AetherError::player_not_found(player_id))?;
        state.current_mood = mood;
        Ok(())
    }

    /// Number of players seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.players.lock().len()
    }

    /// Whether no player has been seen yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.lock().is_empty()
    }

    /// History window size, in exchanges.
    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    /// Snapshots of every player, sorted by player id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<PlayerState> {
        let mut states: Vec<PlayerState> = self.players.lock().values().cloned().collect();
        states.sort_by(|a, b| a.player_id.cmp(&b.player_id));
        states
    }

    /// The registry new players are assigned from.
    #[must_use]
    pub fn registry(&self) -> &NpcRegistry {
        &self.registry
    }
}

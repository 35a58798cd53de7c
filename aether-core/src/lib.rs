//! # Aether Core Library
//!
//! Conversation state for a batch of players talking to a small roster of
//! mood-driven NPCs. Nothing in this crate performs I/O against a language
//! model; it owns the parts of the system with real invariants:
//!
//! - [`NpcRegistry`] — fixed-order NPC catalog with round-robin assignment
//! - [`mood`] — pure trigger-table state machine over [`Mood`]
//! - [`ConversationStore`] — per-player state with a bounded exchange window
//! - [`scheduler`] — chronological, tie-stable ordering of raw input
//!
//! The orchestration loop that ties these together with a generation backend
//! lives in `aether-engine`.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod mood;
pub mod registry;
pub mod scheduler;
pub mod state;
pub mod types;

pub use config::AetherConfig;
pub use error::{AetherError, Result};
pub use mood::Mood;
pub use registry::NpcRegistry;
pub use state::{ConversationStore, PlayerState};
pub use types::*;

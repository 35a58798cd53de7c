//! # aether-engine — Batch Conversation Orchestration
//!
//! Wires the game-agnostic `aether-core` state machinery to an
//! `aether-llm` generation backend and turns a batch of raw player messages
//! into interaction records.
//!
//! ## Architecture
//!
//! ```text
//!   raw batch ──► scheduler ──► Orchestrator ──► InteractionRecord stream
//!                                  │   ▲
//!             ┌────────────────────┘   │
//!             ▼                        │
//!   ConversationStore ◄─► mood ◄─► NpcRegistry
//!             │
//!             ▼
//!   context (prompt) ──► Generator ──► normalize / fallback
//! ```
//!
//! ## Modules
//!
//! - `orchestrator` — per-message pipeline, sequential and per-player parallel runs
//! - `context` — bounded prompt construction
//! - `normalize` — trimming and sentence-boundary truncation of model output
//! - `fallback` — deterministic stand-in lines when generation fails
//! - `record` — interaction records and batch reports
//! - `input` / `output` — JSON loading and JSONL / JSON / CSV writing
//! - `telemetry` — tracing subscriber setup for the binary

pub mod context;
pub mod error;
pub mod fallback;
pub mod input;
pub mod normalize;
pub mod orchestrator;
pub mod output;
pub mod record;
pub mod telemetry;

pub use error::EngineError;
pub use orchestrator::{EngineSettings, Orchestrator};
pub use record::{BatchReport, BatchSummary, InteractionRecord};

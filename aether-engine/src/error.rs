//! Engine error types.

use thiserror::Error;

use aether_core::AetherError;

/// Errors that stop an engine operation.
///
/// Generation failures are deliberately absent: they are absorbed into
/// fallback responses and never surface here.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Core state or configuration error.
    #[error(transparent)]
    Core(#[from] AetherError),

    /// A prompt template could not be loaded.
    #[error("Prompt template error: {0}")]
    Template(String),

    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON input or output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV output failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A per-player worker task panicked or was cancelled.
    #[error("Worker task failed: {0}")]
    Task(String),
}

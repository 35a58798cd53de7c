//! # aether-llm — Generation Backends for Aether
//!
//! Everything that talks to a language model sits behind the [`Generator`]
//! trait. The engine only ever sees text or a classified
//! [`GenerationError`]; it never inspects HTTP.
//!
//! Backends provided by [`LlmClient`]:
//!   - **Ollama** (local, default)
//!   - **OpenAI-compatible API** (OpenAI, Together, vLLM, ...)
//!   - **None** — every call fails, so the engine answers with fallback
//!     lines (offline runs and dry runs)
//!
//! Failure classification:
//!
//! ```text
//! 401 / 403                 → Auth        (not retried)
//! 429                       → RateLimit   (retried, honours Retry-After)
//! client timeout            → Timeout     (retried)
//! other status / transport  → Transport   (retried)
//! ```

pub mod client;
pub mod error;
pub mod prompt;
pub mod types;

pub use client::{Generator, LlmClient, LlmProvider};
pub use error::{FailureKind, GenerationError};
pub use types::{GenerationRequest, GenerationResponse};

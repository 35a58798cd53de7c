//! Configuration for a batch run.
//!
//! Maps directly to `aether.toml`. Every field has a default, so an empty
//! file (or no file at all) describes the stock village with three NPCs and
//! a local Ollama backend.

use serde::{Deserialize, Serialize};

use crate::error::{AetherError, Result};
use crate::registry::default_roster;
use crate::state::DEFAULT_HISTORY_WINDOW;
use crate::types::NpcPersonality;

/// Providers understood by `aether-llm`.
pub const KNOWN_PROVIDERS: [&str; 3] = ["ollama", "openai", "none"];

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AetherConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Conversation window and response shaping.
    #[serde(default)]
    pub conversation: ConversationConfig,
    /// Language model backend settings.
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Static setting description shared by every prompt.
    #[serde(default)]
    pub world: WorldConfig,
    /// NPC roster in assignment order. Empty means the stock roster.
    #[serde(default)]
    pub npcs: Vec<NpcPersonality>,
}

impl AetherConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `AetherError::Configuration` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| AetherError::Configuration(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check values that serde cannot.
    ///
    /// # Errors
    /// Returns `AetherError::Configuration` describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        if self.conversation.history_window == 0 {
            return Err(AetherError::Configuration(
                "conversation.history_window must be at least 1".into(),
            ));
        }
        if self.conversation.max_response_chars < MIN_RESPONSE_CHARS {
            return Err(AetherError::Configuration(format!(
                "conversation.max_response_chars must be at least {MIN_RESPONSE_CHARS}"
            )));
        }
        if !KNOWN_PROVIDERS.contains(&self.generation.provider.as_str()) {
            return Err(AetherError::Configuration(format!(
                "unknown generation.provider '{}' (expected one of {})",
                self.generation.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(AetherError::Configuration(
                "generation.temperature must be within 0.0..=2.0".into(),
            ));
        }
        if self.generation.max_tokens == 0 {
            return Err(AetherError::Configuration(
                "generation.max_tokens must be positive".into(),
            ));
        }
        if self.generation.max_concurrency == 0 {
            return Err(AetherError::Configuration(
                "generation.max_concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The configured roster, or the stock roster when none is configured.
    #[must_use]
    pub fn roster(&self) -> Vec<NpcPersonality> {
        if self.npcs.is_empty() {
            default_roster()
        } else {
            self.npcs.clone()
        }
    }
}

/// Smallest response length the normalizer can truncate to sensibly.
pub const MIN_RESPONSE_CHARS: usize = 16;

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error. `RUST_LOG` wins if set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Conversation window and response shaping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Exchanges kept per player (one exchange = player line + NPC line).
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Responses longer than this are cut at a sentence boundary.
    #[serde(default = "default_max_response_chars")]
    pub max_response_chars: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_window: DEFAULT_HISTORY_WINDOW,
            max_response_chars: default_max_response_chars(),
        }
    }
}

/// Language model backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Provider: "ollama", "openai", "none".
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Base URL for the LLM API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key (OpenAI-compatible only).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Maximum tokens per response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Hard timeout for one generation call, retries included.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Retries on transient failures before giving up on a message.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay between retries; doubled per attempt.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Generation calls allowed in flight at once.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Process players concurrently instead of one message at a time.
    #[serde(default)]
    pub parallel: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            request_timeout_ms: default_request_timeout_ms(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_concurrency: default_max_concurrency(),
            parallel: false,
        }
    }
}

/// Static setting description shared by every prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Name of the game world.
    #[serde(default = "default_world_name")]
    pub name: String,
    /// Setting description given to every NPC.
    #[serde(default = "default_world_description")]
    pub description: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            description: default_world_description(),
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_log_level() -> String {
    "info".to_string()
}
fn default_history_window() -> usize {
    DEFAULT_HISTORY_WINDOW
}
fn default_max_response_chars() -> usize {
    400
}
fn default_provider() -> String {
    "ollama".to_string()
}
fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_model() -> String {
    "llama3.2".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_max_tokens() -> u32 {
    150
}
fn default_temperature() -> f32 {
    0.7
}
fn default_request_timeout_ms() -> u64 {
    20_000
}
fn default_max_retries() -> u32 {
    2
}
fn default_retry_backoff_ms() -> u64 {
    500
}
fn default_max_concurrency() -> usize {
    4
}
fn default_world_name() -> String {
    "Chronicles of Aethermoor".to_string()
}
fn default_world_description() -> String {
    "A medieval fantasy village at the crossroads of ancient kingdoms, a safe haven for \
     adventurers, traders and travelers seeking quests, supplies and information. The village \
     has a Market Square (merchants, traders, gossips), a Blacksmith Quarter (crafters, weapon \
     smiths, armorers), the Guard Barracks (soldiers, captains, veterans), a Tavern District \
     (innkeepers, bards, locals) and the Temple Grounds (clerics, healers, wise folk), with \
     mysterious ruins and ancient forests nearby. Adventurers arrive seeking glory, treasure, \
     knowledge or simply a place to rest; some are complete novices, others seasoned heroes."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = AetherConfig::from_toml("").expect("empty config parses");
        assert_eq!(config.conversation.history_window, 3);
        assert_eq!(config.generation.max_tokens, 150);
        assert!((config.generation.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.roster().len(), 3);
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn custom_roster_replaces_default() {
        let config = AetherConfig::from_toml(
            r#"
            [[npcs]]
            id = "innkeeper"
            name = "Brom"
            role = "Innkeeper"
            background = "Runs the Crossed Keys tavern"
            quirks = ["Polishes the same mug endlessly"]
            "#,
        )
        .expect("valid toml");
        let roster = config.roster();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].name, "Brom");
        assert_eq!(roster[0].quirks, ["Polishes the same mug endlessly"]);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = AetherConfig::default();
        config.conversation.history_window = 0;
        assert!(config.validate().is_err());

        let mut config = AetherConfig::default();
        config.generation.provider = "carrier-pigeon".into();
        assert!(config.validate().is_err());

        let mut config = AetherConfig::default();
        config.generation.temperature = 3.5;
        assert!(config.validate().is_err());

        let mut config = AetherConfig::default();
        config.conversation.max_response_chars = 4;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_toml_is_configuration_error() {
        let err = AetherConfig::from_toml("[generation\nprovider = ").expect_err("bad toml");
        assert!(matches!(err, AetherError::Configuration(_)));
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("aether.toml");
        std::fs::write(&path, "[generation]\nprovider = \"none\"\nparallel = true\n")
            .expect("write config");
        let config = AetherConfig::from_file(&path).expect("load");
        assert_eq!(config.generation.provider, "none");
        assert!(config.generation.parallel);
    }
}

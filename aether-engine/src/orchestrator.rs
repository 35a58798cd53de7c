//! Response Orchestrator — the per-message pipeline.
//!
//! For every scheduled message, in order:
//!
//! 1. fetch or create the player's state (first contact assigns an NPC),
//! 2. look up the assigned NPC,
//! 3. run the mood transition and store the new mood,
//! 4. build a bounded prompt from the pre-update history,
//! 5. call the generator under a deadline,
//! 6. normalize the answer, or
//! 7. fall back to a rule-based line when generation failed,
//! 8. append the exchange to the player's history,
//! 9. emit an [`InteractionRecord`] carrying the pre-update history.
//!
//! Generation failures never abort a batch. Only state inconsistencies
//! (`NotFound`) and task failures do.
//!
//! ## Parallel mode
//!
//! Players are independent, so each player's messages can run as their own
//! task. NPCs are assigned up front in order of first appearance, which makes
//! the round-robin outcome identical to a sequential run; a semaphore caps
//! concurrent generator calls; records are re-sorted into scheduled order at
//! the end.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use aether_core::config::{AetherConfig, MIN_RESPONSE_CHARS};
use aether_core::mood::transition;
use aether_core::scheduler::{partition_by_player, schedule};
use aether_core::{AetherError, ConversationStore, Message, NpcRegistry, RawMessage};
use aether_llm::prompt::PromptTemplate;
use aether_llm::{GenerationError, GenerationRequest, Generator};

use crate::context::build_request;
use crate::error::EngineError;
use crate::fallback::fallback_response;
use crate::normalize::normalize_response;
use crate::record::{BatchReport, InteractionRecord};

/// Runtime knobs for the orchestrator, resolved from [`AetherConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Setting name used in every prompt.
    pub world_name: String,
    /// Setting description used in every prompt.
    pub world_description: String,
    /// Exchanges kept per player.
    pub history_window: usize,
    /// Longest response kept after normalization, in characters.
    pub max_response_chars: usize,
    /// Token cap per generation.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Deadline for one generation call, retries included.
    pub request_timeout: Duration,
    /// Generator calls allowed in flight at once.
    pub max_concurrency: usize,
    /// Whether [`Orchestrator::run`] processes players concurrently.
    pub parallel: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&AetherConfig::default())
    }
}

impl EngineSettings {
    /// Pull the engine-relevant values out of a full configuration.
    #[must_use]
    pub fn from_config(config: &AetherConfig) -> Self {
        Self {
            world_name: config.world.name.clone(),
            world_description: config.world.description.clone(),
            history_window: config.conversation.history_window,
            max_response_chars: config.conversation.max_response_chars,
            max_tokens: config.generation.max_tokens,
            temperature: config.generation.temperature,
            request_timeout: Duration::from_millis(config.generation.request_timeout_ms),
            max_concurrency: config.generation.max_concurrency.max(1),
            parallel: config.generation.parallel,
        }
    }

    /// The request deadline in milliseconds.
    #[must_use]
    pub fn request_timeout_ms(&self) -> u64 {
        u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Drives messages through state, mood, prompt, generation and records.
///
/// Cheap to clone; clones share the same store, generator and limiter.
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<ConversationStore>,
    generator: Arc<dyn Generator>,
    template: Arc<PromptTemplate>,
    settings: Arc<EngineSettings>,
    permits: Arc<Semaphore>,
}

impl Orchestrator {
    /// Create an orchestrator over `registry` with the built-in prompt.
    ///
    /// # Errors
    /// Returns `AetherError::Configuration` for a zero history window or a
    /// response budget under [`MIN_RESPONSE_CHARS`].
    pub fn new(
        registry: Arc<NpcRegistry>,
        generator: Arc<dyn Generator>,
        settings: EngineSettings,
    ) -> Result<Self, EngineError> {
        if settings.max_response_chars < MIN_RESPONSE_CHARS {
            return Err(AetherError::Configuration(format!(
                "max_response_chars must be at least {MIN_RESPONSE_CHARS}, got {}",
                settings.max_response_chars
            ))
            .into());
        }
        let store = ConversationStore::with_window(registry, settings.history_window)?;
        Ok(Self {
            store: Arc::new(store),
            generator,
            template: Arc::new(PromptTemplate::builtin()),
            permits: Arc::new(Semaphore::new(settings.max_concurrency.max(1))),
            settings: Arc::new(settings),
        })
    }

    /// Validate `config`, build its registry and create an orchestrator.
    ///
    /// # Errors
    /// Returns `AetherError::Configuration` for an invalid configuration or
    /// roster.
    pub fn from_config(
        config: &AetherConfig,
        generator: Arc<dyn Generator>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let registry = NpcRegistry::from_personalities(config.roster())?;
        Self::new(Arc::new(registry), generator, EngineSettings::from_config(config))
    }

    /// Replace the prompt template.
    #[must_use]
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = Arc::new(template);
        self
    }

    /// Per-player conversation state.
    #[must_use]
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// The NPC catalog.
    #[must_use]
    pub fn registry(&self) -> &NpcRegistry {
        self.store.registry()
    }

    /// Active settings.
    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Run one message through the full pipeline.
    ///
    /// # Errors
    /// Returns `AetherError::NotFound` if the store and registry disagree.
    /// Generation failures are not errors; they produce a fallback record.
    pub async fn process_message(&self, message: &Message) -> Result<InteractionRecord, EngineError> {
        let state = self.store.get_or_create(&message.player_id);
        let npc = self.registry().get(&state.assigned_npc_id)?;

        let mood = transition(state.current_mood, &message.text);
        if mood != state.current_mood {
            debug!(player = %message.player_id, npc = %npc.id, from = %state.current_mood, to = %mood, "mood changed");
        }
        self.store.set_mood(&message.player_id, mood)?;

        let history = state.history_vec();
        let request = build_request(&self.template, &self.settings, npc, mood, &history, &message.text);

        let (npc_response, generation_failure) = match self.generate(&request, &npc.name).await {
            Ok(text) => (text, None),
            Err(err) => {
                warn!(
                    sequence = message.sequence,
                    player = %message.player_id,
                    npc = %npc.id,
                    kind = %err.kind(),
                    error = %err,
                    "generation failed, using fallback response"
                );
                (fallback_response(&npc.name, mood), Some(err.kind()))
            }
        };

        self.store.append_exchange(&message.player_id, message.text.as_str(), npc_response.as_str())?;

        info!(
            sequence = message.sequence,
            player = %message.player_id,
            npc = %npc.id,
            mood = %mood,
            fallback = generation_failure.is_some(),
            "message processed"
        );

        Ok(InteractionRecord {
            timestamp: message.timestamp,
            sequence: message.sequence,
            player_id: message.player_id.clone(),
            player_message: message.text.clone(),
            npc_id: npc.id.clone(),
            npc_name: npc.name.clone(),
            npc_role: npc.role.clone(),
            npc_mood: mood,
            npc_response,
            conversation_history: history,
            generation_failure,
        })
    }

    /// One bounded, rate-limited generator call with normalized output.
    async fn generate(&self, request: &GenerationRequest, npc_name: &str) -> Result<String, GenerationError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| GenerationError::Transport("generation limiter closed".into()))?;

        let raw = match tokio::time::timeout(self.settings.request_timeout, self.generator.generate(request)).await {
            Ok(result) => result?,
            Err(_) => return Err(GenerationError::Timeout(self.settings.request_timeout_ms())),
        };

        normalize_response(&raw, npc_name, self.settings.max_response_chars)
            .ok_or_else(|| GenerationError::Transport("empty response after normalization".into()))
    }

    /// Schedule and process a raw batch one message at a time.
    ///
    /// # Errors
    /// Stops at the first state inconsistency.
    pub async fn run_batch(&self, raw: Vec<RawMessage>) -> Result<BatchReport, EngineError> {
        let scheduled = schedule(raw);
        let total = scheduled.messages.len();
        info!(messages = total, skipped = scheduled.rejected.len(), mode = "sequential", "batch started");

        let mut records = Vec::with_capacity(total);
        for (position, message) in scheduled.messages.iter().enumerate() {
            debug!(position = position + 1, total, player = %message.player_id, "processing message");
            records.push(self.process_message(message).await?);
        }

        let report = BatchReport { records, skipped: scheduled.rejected };
        info!(summary = %report.summary(), "batch finished");
        Ok(report)
    }

    /// Schedule a raw batch and process each player's messages as a task.
    ///
    /// Produces the same records, in the same order, as [`Self::run_batch`]
    /// given a deterministic generator.
    ///
    /// # Errors
    /// Returns the first state inconsistency or task failure.
    pub async fn run_batch_parallel(&self, raw: Vec<RawMessage>) -> Result<BatchReport, EngineError> {
        let scheduled = schedule(raw);
        let total = scheduled.messages.len();
        let partitions = partition_by_player(&scheduled.messages);
        info!(
            messages = total,
            skipped = scheduled.rejected.len(),
            players = partitions.len(),
            max_concurrency = self.settings.max_concurrency,
            mode = "parallel",
            "batch started"
        );

        // Fix assignments in first-appearance order before any task runs.
        for (player, _) in &partitions {
            self.store.get_or_create(player);
        }

        let mut tasks = JoinSet::new();
        for (player, messages) in partitions {
            let engine = self.clone();
            tasks.spawn(async move {
                let mut records = Vec::with_capacity(messages.len());
                for message in &messages {
                    records.push(engine.process_message(message).await?);
                }
                debug!(player = %player, messages = records.len(), "player partition finished");
                Ok::<_, EngineError>(records)
            });
        }

        let mut records = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            let partition = joined.map_err(|e| EngineError::Task(e.to_string()))??;
            records.extend(partition);
        }
        records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.sequence.cmp(&b.sequence)));

        let report = BatchReport { records, skipped: scheduled.rejected };
        info!(summary = %report.summary(), "batch finished");
        Ok(report)
    }

    /// Process a raw batch in the configured mode.
    ///
    /// # Errors
    /// See [`Self::run_batch`] and [`Self::run_batch_parallel`].
    pub async fn run(&self, raw: Vec<RawMessage>) -> Result<BatchReport, EngineError> {
        if self.settings.parallel {
            self.run_batch_parallel(raw).await
        } else {
            self.run_batch(raw).await
        }
    }
}

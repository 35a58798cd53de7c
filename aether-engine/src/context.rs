//! Dialogue context assembly.
//!
//! Collects everything the model needs for one reply (world, character,
//! mood guide, recent history and the player's line) into template
//! variables and renders them into a [`GenerationRequest`]. Every part is
//! bounded: history by the store's window, the player's line by
//! [`MAX_PLAYER_CHARS`].

use std::borrow::Cow;

use aether_core::{Exchange, Mood, NpcPersonality};
use aether_llm::GenerationRequest;
use aether_llm::prompt::PromptTemplate;

use crate::orchestrator::EngineSettings;

/// How the player is named in rendered history.
pub const PLAYER_LABEL: &str = "Adventurer";

/// History text used before the first exchange.
pub const FIRST_CONVERSATION: &str = "(This is your first conversation with this adventurer.)";

/// Player text beyond this many characters is cut from the prompt.
pub const MAX_PLAYER_CHARS: usize = 500;

/// Render the history window oldest first, one speaker per line.
#[must_use]
pub fn render_history(history: &[Exchange], npc_name: &str) -> String {
    if history.is_empty() {
        return FIRST_CONVERSATION.to_string();
    }
    history
        .iter()
        .map(|ex| format!("{PLAYER_LABEL}: {}\n{npc_name}: {}", ex.player, ex.npc))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Quirks as one line.
#[must_use]
pub fn describe_quirks(npc: &NpcPersonality) -> String {
    if npc.quirks.is_empty() {
        "none in particular".to_string()
    } else {
        npc.quirks.join("; ")
    }
}

/// Cut `text` to at most `max` characters, on a char boundary.
#[must_use]
pub fn cap_chars(text: &str, max: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max) {
        Some((cut, _)) => Cow::Owned(format!("{}…", &text[..cut])),
        None => Cow::Borrowed(text),
    }
}

/// Build the generation request for one message.
///
/// `history` is the window as it stood before this message.
#[must_use]
pub fn build_request(
    template: &PromptTemplate,
    settings: &EngineSettings,
    npc: &NpcPersonality,
    mood: Mood,
    history: &[Exchange],
    player_message: &str,
) -> GenerationRequest {
    let quirks = describe_quirks(npc);
    let history = render_history(history, &npc.name);
    let player_message = cap_chars(player_message.trim(), MAX_PLAYER_CHARS);

    let vars = [
        ("world_name", settings.world_name.as_str()),
        ("world_description", settings.world_description.as_str()),
        ("npc_name", npc.name.as_str()),
        ("npc_role", npc.role.as_str()),
        ("npc_background", npc.background.as_str()),
        ("npc_quirks", quirks.as_str()),
        ("mood", mood.as_str()),
        ("mood_guideline", mood.guideline()),
        ("history", history.as_str()),
        ("player_message", &*player_message),
    ];
    let (system, user) = template.render(&vars);

    GenerationRequest::new(system, user)
        .with_max_tokens(settings.max_tokens)
        .with_temperature(settings.temperature)
        .with_timeout(settings.request_timeout_ms())
}

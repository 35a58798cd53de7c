//! Prompt templates for NPC dialogue.
//!
//! The built-in template is compiled in; a TOML file with the same shape
//! can replace it without rebuilding:
//!
//! ```toml
//! [prompt]
//! version = "2"
//! system = "You are {npc_name} ..."
//! user = "The adventurer says: {player_message}"
//! ```

use std::path::Path;

use serde::Deserialize;

/// Dialogue system prompt: world, character, mood guide, roleplay rules.
pub const DIALOGUE_SYSTEM: &str = r#"=== GAME WORLD CONTEXT ===
You are an NPC (non-player character) in "{world_name}", a medieval fantasy RPG.
{world_description}

=== YOUR CHARACTER ===
Name: {npc_name}
Role: {npc_role}
Background: {npc_background}
Personality quirks: {npc_quirks}
Current emotional state: {mood}

=== HOW TO BEHAVE RIGHT NOW ===
{mood_guideline}

=== ROLEPLAY GUIDELINES ===
1. Stay in character. Never break the fourth wall or mention you are an AI or a game mechanic.
2. Be concise: one or two sentences at most.
3. Show your mood through word choice and tone; never state it outright.
4. Weave your quirks in naturally.
5. Stay consistent with your earlier conversation with this adventurer.
6. Always give the adventurer something useful: information, a direction, a quest hint or some flavour.
7. Use medieval fantasy language and avoid modern slang, but stay understandable."#;

/// Dialogue user prompt: the bounded history and the current line.
pub const DIALOGUE_USER: &str = r"=== INTERACTION HISTORY ===
Previous conversation with this adventurer:
{history}

=== CURRENT INTERACTION ===
The adventurer approaches you and says: {player_message}

*{npc_name} responds:*";

/// Single-pass template interpolation.
///
/// Replaces `{key}` with the matching value. Unknown placeholders are kept
/// verbatim, and substituted values are never re-scanned, so braces inside
/// player text stay literal.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + 256);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let key = &after[..close];
        match vars.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => out.push_str(value),
            None => {
                out.push('{');
                out.push_str(key);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

/// `[prompt]` section of a TOML template file.
#[derive(Debug, Clone, Deserialize)]
struct TomlPromptFile {
    prompt: TomlPromptData,
}

#[derive(Debug, Clone, Deserialize)]
struct TomlPromptData {
    version: String,
    system: String,
    user: String,
}

/// A loaded, ready-to-render dialogue template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    /// Template version string ("builtin" for the compiled-in one).
    pub version: String,
    /// System prompt template (contains `{key}` placeholders).
    pub system: String,
    /// User prompt template (contains `{key}` placeholders).
    pub user: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptTemplate {
    /// The compiled-in dialogue template.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            version: "builtin".into(),
            system: DIALOGUE_SYSTEM.into(),
            user: DIALOGUE_USER.into(),
        }
    }

    /// Parse a template from TOML text.
    ///
    /// # Errors
    /// Returns a description of the problem if the TOML is invalid or the
    /// template never includes the player's message.
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        let parsed: TomlPromptFile =
            toml::from_str(content).map_err(|e| format!("invalid prompt template: {e}"))?;
        let d = parsed.prompt;
        if !d.user.contains("{player_message}") {
            return Err("prompt template never uses {player_message}".into());
        }
        Ok(Self {
            version: d.version,
            system: d.system,
            user: d.user,
        })
    }

    /// Load a template from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Render `(system, user)` with all known placeholders filled.
    #[must_use]
    pub fn render(&self, vars: &[(&str, &str)]) -> (String, String) {
        (render_template(&self.system, vars), render_template(&self.user, vars))
    }
}

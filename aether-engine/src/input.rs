//! Batch input loading.
//!
//! The input file is a JSON array of message objects:
//!
//! ```json
//! [
//!   { "player_id": 1, "text": "Hello", "timestamp": "2025-08-26T15:01:10" }
//! ]
//! ```
//!
//! A file that is not a JSON array is an error. Entries that are not
//! message-shaped are kept as empty raw records so the scheduler can report
//! them by position.

use std::path::Path;

use serde_json::Value;
use tracing::info;

use aether_core::{AetherError, RawMessage};

use crate::error::EngineError;

/// Parse a JSON array of raw message records.
///
/// # Errors
/// `Json` if the text is not JSON, `MalformedInput` if it is not an array.
pub fn parse_messages(content: &str) -> Result<Vec<RawMessage>, EngineError> {
    let value: Value = serde_json::from_str(content)?;
    let Value::Array(entries) = value else {
        return Err(AetherError::malformed(0, "input must be a JSON array of messages").into());
    };
    Ok(entries
        .into_iter()
        .map(|entry| serde_json::from_value(entry).unwrap_or_default())
        .collect())
}

/// Read and parse a batch file.
///
/// # Errors
/// `Io` if the file cannot be read, otherwise as [`parse_messages`].
pub fn load_messages(path: impl AsRef<Path>) -> Result<Vec<RawMessage>, EngineError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let messages = parse_messages(&content)?;
    info!(path = %path.display(), records = messages.len(), "loaded input batch");
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aether_core::scheduler::schedule;

    #[test]
    fn parses_player_batch_shape() {
        let raw = parse_messages(
            r#"[
                {"player_id": 1, "text": "Hello", "timestamp": "2025-08-26T15:01:10"},
                {"player_id": "p2", "text": "Hi", "timestamp": "2025-08-26T15:01:05Z"}
            ]"#,
        )
        .expect("valid batch");
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0], RawMessage::new(1, "Hello", "2025-08-26T15:01:10"));
    }

    #[test]
    fn non_object_entries_become_rejections() {
        let raw = parse_messages(r#"[42, {"player_id": 1, "text": "ok", "timestamp": "2025-01-01T00:00:00"}]"#)
            .expect("valid array");
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0], RawMessage::default());
        let scheduled = schedule(raw);
        assert_eq!(scheduled.messages.len(), 1);
        assert_eq!(scheduled.rejected[0].index, 0);
    }

    #[test]
    fn non_array_is_an_error() {
        assert!(matches!(
            parse_messages(r#"{"player_id": 1}"#),
            Err(EngineError::Core(AetherError::MalformedInput { .. }))
        ));
        assert!(matches!(parse_messages("not json"), Err(EngineError::Json(_))));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("players.json");
        std::fs::write(&path, r#"[{"player_id": 3, "text": "Thanks!", "timestamp": "2025-08-26T15:02:00"}]"#)
            .expect("write");
        let raw = load_messages(&path).expect("load");
        assert_eq!(raw.len(), 1);
        assert!(matches!(load_messages(dir.path().join("missing.json")), Err(EngineError::Io(_))));
    }
}

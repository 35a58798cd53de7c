//! Message Scheduler — chronological ordering of a raw input batch.
//!
//! Records are validated one by one; a bad record is reported as a
//! [`Rejection`] and left out, it never poisons the batch. Valid messages
//! are sorted by timestamp, ties broken by their position in the input, so
//! the same set of records always yields the same order.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::warn;

use crate::error::AetherError;
use crate::types::{Message, PlayerId, RawMessage};

/// Accepted timestamp layouts carrying an offset.
const OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

/// Accepted naive (offset-less) timestamp layouts, read as UTC.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A raw record that was excluded from the schedule.
#[derive(Debug)]
pub struct Rejection {
    /// Position of the record in the raw input.
    pub index: usize,
    /// Always an [`AetherError::MalformedInput`].
    pub error: AetherError,
}

/// The outcome of scheduling one batch.
#[derive(Debug, Default)]
pub struct Schedule {
    /// Valid messages in processing order.
    pub messages: Vec<Message>,
    /// Records that could not be scheduled, in input order.
    pub rejected: Vec<Rejection>,
}

/// Validate and order a raw batch.
pub fn schedule(raw: impl IntoIterator<Item = RawMessage>) -> Schedule {
    let mut out = Schedule::default();

    for (index, record) in raw.into_iter().enumerate() {
        match parse_message(index, record) {
            Ok(message) => out.messages.push(message),
            Err(error) => {
                warn!(index, %error, "skipping malformed input record");
                out.rejected.push(Rejection { index, error });
            }
        }
    }

    // Sequence numbers are unique, so this is a total order.
    out.messages
        .sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.sequence.cmp(&b.sequence)));
    out
}

/// Validate one raw record.
///
/// # Errors
/// Returns `AetherError::MalformedInput` naming the first problem found.
pub fn parse_message(index: usize, raw: RawMessage) -> Result<Message, AetherError> {
    let player_id = match raw.player_id {
        Some(Value::String(s)) if !s.trim().is_empty() => PlayerId(s.trim().to_string()),
        Some(Value::Number(n)) => PlayerId(integral_id(&n).ok_or_else(|| {
            AetherError::malformed(index, format!("player_id must be an integer, got {n}"))
        })?),
        Some(Value::String(_)) => return Err(AetherError::malformed(index, "empty player_id")),
        Some(Value::Null) | None => return Err(AetherError::malformed(index, "missing player_id")),
        Some(other) => {
            return Err(AetherError::malformed(
                index,
                format!("player_id must be a string or integer, got {other}"),
            ));
        }
    };

    let text = match raw.text {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => return Err(AetherError::malformed(index, "missing text")),
        Some(other) => {
            return Err(AetherError::malformed(
                index,
                format!("text must be a string, got {other}"),
            ));
        }
    };

    let timestamp = match raw.timestamp {
        Some(Value::String(s)) => parse_timestamp(&s).ok_or_else(|| {
            AetherError::malformed(index, format!("unparsable timestamp '{s}'"))
        })?,
        Some(Value::Null) | None => {
            return Err(AetherError::malformed(index, "missing timestamp"));
        }
        Some(other) => {
            return Err(AetherError::malformed(
                index,
                format!("timestamp must be a string, got {other}"),
            ));
        }
    };

    Ok(Message {
        sequence: index,
        player_id,
        text,
        timestamp,
    })
}

/// Decimal form of an integral JSON number; `7.0` reads as `7`.
fn integral_id(n: &serde_json::Number) -> Option<String> {
    if let Some(i) = n.as_i64() {
        return Some(i.to_string());
    }
    if let Some(u) = n.as_u64() {
        return Some(u.to_string());
    }
    n.as_f64()
        .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15)
        .map(|f| format!("{f:.0}"))
}

/// Parse an ISO-8601 timestamp.
///
/// Accepts RFC 3339, offsets written `+hh:mm` or `+hhmm`, or a naive
/// date-time (seconds optional) / date which is taken to be UTC.
#[must_use]
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(input, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Split scheduled messages into per-player runs.
///
/// Players appear in order of their first scheduled message; each run keeps
/// the scheduled order of that player's messages.
#[must_use]
pub fn partition_by_player(messages: &[Message]) -> Vec<(PlayerId, Vec<Message>)> {
    let mut slots: std::collections::HashMap<&PlayerId, usize> = std::collections::HashMap::new();
    let mut partitions: Vec<(PlayerId, Vec<Message>)> = Vec::new();

    for message in messages {
        let slot = *slots.entry(&message.player_id).or_insert_with(|| {
            partitions.push((message.player_id.clone(), Vec::new()));
            partitions.len() - 1
        });
        partitions[slot].1.push(message.clone());
    }

    partitions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(player: &str, text: &str, ts: &str) -> RawMessage {
        RawMessage::new(player, text, ts)
    }

    #[test]
    fn sorts_by_timestamp() {
        let schedule = schedule(vec![
            raw("a", "third", "2024-01-01T10:02:00"),
            raw("b", "first", "2024-01-01T10:00:00"),
            raw("a", "second", "2024-01-01T10:01:00"),
        ]);
        let texts: Vec<&str> = schedule.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);
        assert!(schedule.rejected.is_empty());
    }

    #[test]
    fn equal_timestamps_keep_input_order() {
        let schedule = schedule(vec![
            raw("z", "one", "2024-01-01T10:00:00Z"),
            raw("a", "two", "2024-01-01T10:00:00+00:00"),
            raw("m", "three", "2024-01-01T10:00:00"),
        ]);
        let seq: Vec<usize> = schedule.messages.iter().map(|m| m.sequence).collect();
        assert_eq!(seq, [0, 1, 2]);
    }

    #[test]
    fn offsets_are_normalised_before_sorting() {
        // 10:30+02:00 is 08:30 UTC, earlier than 09:00Z.
        let schedule = schedule(vec![
            raw("a", "later", "2024-01-01T09:00:00Z"),
            raw("b", "earlier", "2024-01-01T10:30:00+02:00"),
        ]);
        assert_eq!(schedule.messages[0].text, "earlier");
    }

    #[test]
    fn malformed_records_are_reported_not_dropped() {
        let schedule = schedule(vec![
            raw("a", "ok", "2024-01-01T10:00:00"),
            raw("b", "bad time", "yesterday at noon"),
            RawMessage {
                player_id: None,
                ..raw("c", "no player", "2024-01-01T10:00:00")
            },
            RawMessage {
                text: None,
                ..raw("d", "", "2024-01-01T10:00:00")
            },
        ]);
        assert_eq!(schedule.messages.len(), 1);
        let indices: Vec<usize> = schedule.rejected.iter().map(|r| r.index).collect();
        assert_eq!(indices, [1, 2, 3]);
        assert!(schedule
            .rejected
            .iter()
            .all(|r| matches!(r.error, AetherError::MalformedInput { .. })));
    }

    #[test]
    fn numeric_player_ids_are_accepted() {
        let record = RawMessage::new(42, "hi", "2024-01-01 10:00:00");
        let message = parse_message(0, record).expect("valid");
        assert_eq!(message.player_id.as_str(), "42");
    }

    #[test]
    fn boolean_player_id_is_malformed() {
        let record = RawMessage::new(true, "hi", "2024-01-01T10:00:00");
        assert!(parse_message(0, record).is_err());
    }

    #[test]
    fn timestamp_formats() {
        assert!(parse_timestamp("2024-03-05T12:00:00").is_some());
        assert!(parse_timestamp("2024-03-05T12:00:00.250").is_some());
        assert!(parse_timestamp("2024-03-05 12:00:00").is_some());
        assert!(parse_timestamp("2024-03-05T12:00:00Z").is_some());
        assert!(parse_timestamp("2024-03-05T12:00:00-05:00").is_some());
        assert!(parse_timestamp("2024-03-05").is_some());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("2024-13-45T99:00:00").is_none());
    }

    #[test]
    fn minute_precision_and_compact_offsets() {
        let at = |s: &str| parse_timestamp(s).map(|t| t.to_rfc3339());
        assert_eq!(at("2025-08-26T15:01").as_deref(), Some("2025-08-26T15:01:00+00:00"));
        assert_eq!(at("2025-08-26 15:01").as_deref(), Some("2025-08-26T15:01:00+00:00"));
        assert_eq!(at("2025-08-26T15:01:10+0000").as_deref(), Some("2025-08-26T15:01:10+00:00"));
        assert_eq!(at("2025-08-26T17:01:10.5+0200").as_deref(), Some("2025-08-26T15:01:10.500+00:00"));
        assert_eq!(at("2025-08-26 15:01:10-05:00").as_deref(), Some("2025-08-26T20:01:10+00:00"));
        assert!(parse_timestamp("2025-08-26T15").is_none());
    }

    #[test]
    fn integral_float_player_id_matches_integer() {
        let id = |v: Value| parse_message(0, RawMessage::new(v, "hi", "2024-01-01T10:00:00")).map(|m| m.player_id);
        assert_eq!(id(serde_json::json!(7.0)).expect("integral float"), id(serde_json::json!(7)).expect("int"));
        assert_eq!(id(serde_json::json!(7.0)).expect("integral float").as_str(), "7");
        assert_eq!(id(serde_json::json!(-3)).expect("negative").as_str(), "-3");
        assert!(matches!(id(serde_json::json!(7.5)), Err(AetherError::MalformedInput { .. })));
    }

    #[test]
    fn partitions_follow_first_appearance() {
        let schedule = schedule(vec![
            raw("b", "b1", "2024-01-01T10:00:00"),
            raw("a", "a1", "2024-01-01T10:01:00"),
            raw("b", "b2", "2024-01-01T10:02:00"),
            raw("a", "a2", "2024-01-01T10:03:00"),
        ]);
        let partitions = partition_by_player(&schedule.messages);
        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions[0].0.as_str(), "b");
        let b_texts: Vec<&str> = partitions[0].1.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(b_texts, ["b1", "b2"]);
        let a_texts: Vec<&str> = partitions[1].1.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(a_texts, ["a1", "a2"]);
    }
}

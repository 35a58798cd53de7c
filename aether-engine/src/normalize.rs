//! Response normalization.
//!
//! Models pad their answers: surrounding whitespace, a speaker tag echoing
//! the prompt, quotes around the whole line, or a ramble past the length
//! budget. [`normalize_response`] removes all of that and returns `None`
//! when nothing usable is left.

const TERMINATORS: [char; 3] = ['.', '!', '?'];
const QUOTE_PAIRS: [(char, char); 3] = [('"', '"'), ('\u{201c}', '\u{201d}'), ('\'', '\'')];

/// Clean up raw model output.
///
/// The result is at most `max_chars` characters long. When it has to be
/// cut, the cut lands after the last sentence terminator that fits; failing
/// that, on the last word boundary with a trailing ellipsis.
#[must_use]
pub fn normalize_response(raw: &str, npc_name: &str, max_chars: usize) -> Option<String> {
    let text = raw.trim();
    let text = strip_speaker_tag(text, npc_name).trim();
    let text = strip_wrapping_quotes(text).trim();
    if text.is_empty() {
        return None;
    }
    Some(truncate(text, max_chars))
}

fn strip_speaker_tag<'a>(text: &'a str, npc_name: &str) -> &'a str {
    let tag_len = npc_name.len() + 1;
    if npc_name.is_empty() || text.len() < tag_len {
        return text;
    }
    match text.get(..tag_len) {
        Some(head)
            if head.ends_with(':') && head[..npc_name.len()].eq_ignore_ascii_case(npc_name) =>
        {
            &text[tag_len..]
        }
        _ => text,
    }
}

fn strip_wrapping_quotes(text: &str) -> &str {
    for (open, close) in QUOTE_PAIRS {
        if let Some(inner) = text.strip_prefix(open).and_then(|t| t.strip_suffix(close)) {
            // Lines with inner quotes are dialogue with attribution; keep them.
            if !inner.contains(close) {
                return inner;
            }
        }
    }
    text
}

fn truncate(text: &str, max_chars: usize) -> String {
    let Some((limit, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };
    let head = &text[..limit];

    let sentence_end = head
        .char_indices()
        .filter(|&(i, c)| {
            TERMINATORS.contains(&c)
                && text[i + c.len_utf8()..].chars().next().is_none_or(char::is_whitespace)
        })
        .map(|(i, c)| i + c.len_utf8())
        .last();
    if let Some(end) = sentence_end {
        return head[..end].to_string();
    }

    // Reserve one char for the ellipsis.
    let budget = match head.char_indices().last() {
        Some((i, _)) => &head[..i],
        None => head,
    };
    let cut = budget
        .rfind(char::is_whitespace)
        .map_or(budget, |i| &budget[..i])
        .trim_end();
    let cut = if cut.is_empty() { budget } else { cut };
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_whitespace() {
        assert_eq!(
            normalize_response("  Move along.\n", "Marcus", 400).as_deref(),
            Some("Move along.")
        );
    }

    #[test]
    fn strips_speaker_tag_and_quotes() {
        assert_eq!(
            normalize_response("Marcus: \"Move along, stranger.\"", "Marcus", 400).as_deref(),
            Some("Move along, stranger.")
        );
        assert_eq!(
            normalize_response("marcus:Halt!", "Marcus", 400).as_deref(),
            Some("Halt!")
        );
        assert_eq!(
            normalize_response("\u{201c}Fine wares!\u{201d}", "Elena", 400).as_deref(),
            Some("Fine wares!")
        );
    }

    #[test]
    fn inner_quotes_are_kept() {
        let raw = "\"Aye,\" said the guard, \"go.\"";
        assert_eq!(normalize_response(raw, "Marcus", 400).as_deref(), Some(raw));
    }

    #[test]
    fn empty_output_is_none() {
        assert_eq!(normalize_response("   ", "Marcus", 400), None);
        assert_eq!(normalize_response("Marcus:  ", "Marcus", 400), None);
        assert_eq!(normalize_response("\"\"", "Marcus", 400), None);
    }

    #[test]
    fn truncates_at_sentence_boundary() {
        let raw = "The forge is hot. Steel waits for no one. And then there was the time";
        let out = normalize_response(raw, "Thorin", 45).expect("non-empty");
        assert_eq!(out, "The forge is hot. Steel waits for no one.");
    }

    #[test]
    fn falls_back_to_word_boundary_with_ellipsis() {
        let raw = "a very long sentence without any terminator at all in sight";
        let out = normalize_response(raw, "Thorin", 20).expect("non-empty");
        assert_eq!(out, "a very long…");
        assert!(out.chars().count() <= 20);
    }

    #[test]
    fn decimal_points_are_not_sentence_ends() {
        let out = normalize_response("It costs 3.5 gold pieces and more words", "Elena", 16)
            .expect("non-empty");
        assert_eq!(out, "It costs 3.5…");
    }

    #[test]
    fn hard_cut_for_one_long_word() {
        let out = normalize_response(&"x".repeat(30), "Elena", 16).expect("non-empty");
        assert_eq!(out.chars().count(), 16);
        assert!(out.ends_with('…'));
    }
}

//! Mood Engine — trigger-driven NPC mood state machine.
//!
//! A player's message is scanned against a static [`TRIGGER_TABLE`]. The
//! first matching class, in table order, decides the next mood:
//!
//! ```text
//! Angry  >  Friendly  >  Confused  >  Helpful        (priority, high → low)
//! ```
//!
//! A message with no trigger lets the mood decay one step toward
//! [`Mood::Neutral`]. Every non-neutral mood is one step away from neutral,
//! so a single untriggered message resets it; moods are a short-lived
//! reaction, not a grudge.
//!
//! [`transition`] is total and pure: it is defined for every
//! `(Mood, &str)` pair, including the empty string, and never fails.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete emotional state of an NPC towards one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    /// Professional, mildly interested.
    #[default]
    Neutral,
    /// Warm and welcoming.
    Friendly,
    /// Curt and irritated, still does the job.
    Angry,
    /// Eager to assist in detail.
    Helpful,
    /// Puzzled, asks for clarification.
    Confused,
}

impl Mood {
    /// Every mood, in declaration order.
    pub const ALL: [Mood; 5] = [
        Mood::Neutral,
        Mood::Friendly,
        Mood::Angry,
        Mood::Helpful,
        Mood::Confused,
    ];

    /// Lowercase label, as used in prompts and interaction records.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Friendly => "friendly",
            Self::Angry => "angry",
            Self::Helpful => "helpful",
            Self::Confused => "confused",
        }
    }

    /// The mood one decay step closer to neutral.
    #[must_use]
    pub fn decayed(self) -> Mood {
        Mood::Neutral
    }

    /// Behaviour guide injected into the prompt while the NPC is in this mood.
    #[must_use]
    pub fn guideline(self) -> &'static str {
        match self {
            Self::Neutral => {
                "Be professional but not overly warm. Give straightforward, useful information, \
                 keep your usual mannerisms and show mild interest in the adventurer's goals. \
                 Example tone: \"I can help with that. The blacksmith's shop is just down the \
                 cobblestone path, past the fountain.\""
            }
            Self::Friendly => {
                "Be welcoming and enthusiastic. Offer extra help, share a personal anecdote or \
                 some local gossip, and show genuine interest in the adventurer's journey. \
                 Example tone: \"Well hello there, friend! You look like you could use some \
                 guidance, and perhaps a good meal too!\""
            }
            Self::Angry => {
                "Be curt and somewhat hostile, but not completely unhelpful. Keep answers short, \
                 let irritation show through gruff or impatient wording, and still give the \
                 basic information because you have a job to do. Example tone: \"What do you \
                 want? I'm busy here... Fine, the inn is that way. Now leave me be.\""
            }
            Self::Helpful => {
                "Be eager to assist with detailed information. Offer practical advice and \
                 warnings, share useful tips about the village and its surroundings, and show \
                 expertise in your field. Example tone: \"Ah, you're looking for supplies? Let \
                 me tell you exactly what you'll need and where to find the best prices...\""
            }
            Self::Confused => {
                "Be uncertain and ask for clarification. Show puzzlement about the request, \
                 ask follow-up questions and make it clear you are trying to understand. \
                 Example tone: \"I'm not quite sure what you mean by that... Are you talking \
                 about the old ruins or the new merchant district?\""
            }
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Trigger Table
// ---------------------------------------------------------------------------

/// A lexical pattern that can fire a mood transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Matches one whole word of the message (`"hate"` does not match `"whatever"`).
    Word(&'static str),
    /// Matches a run of whole words (`"shut up"`).
    Phrase(&'static str),
    /// Matches anywhere in the raw lowercased text, punctuation included (`"??"`).
    Marker(&'static str),
}

/// One keyword class and the mood it leads to.
#[derive(Debug, Clone, Copy)]
pub struct TriggerRule {
    /// Mood entered when any trigger of this rule matches.
    pub mood: Mood,
    /// Patterns of this class. All lowercase.
    pub triggers: &'static [Trigger],
}

/// Keyword classes in priority order. The first rule with a match wins.
pub static TRIGGER_TABLE: [TriggerRule; 4] = [
    TriggerRule {
        mood: Mood::Angry,
        triggers: &[
            Trigger::Word("stupid"),
            Trigger::Word("useless"),
            Trigger::Word("hate"),
            Trigger::Word("idiot"),
            Trigger::Word("fool"),
            Trigger::Word("worthless"),
            Trigger::Word("pathetic"),
            Trigger::Word("incompetent"),
            Trigger::Phrase("shut up"),
        ],
    },
    TriggerRule {
        mood: Mood::Friendly,
        triggers: &[
            Trigger::Word("thank"),
            Trigger::Word("thanks"),
            Trigger::Word("appreciate"),
            Trigger::Word("grateful"),
            Trigger::Word("great"),
            Trigger::Word("wonderful"),
            Trigger::Word("amazing"),
            Trigger::Word("awesome"),
            Trigger::Word("nice"),
            Trigger::Phrase("well done"),
            Trigger::Phrase("good job"),
        ],
    },
    TriggerRule {
        mood: Mood::Confused,
        triggers: &[
            Trigger::Word("what"),
            Trigger::Word("huh"),
            Trigger::Word("confused"),
            Trigger::Word("lost"),
            Trigger::Phrase("don't understand"),
            Trigger::Phrase("do not understand"),
            Trigger::Marker("??"),
        ],
    },
    TriggerRule {
        mood: Mood::Helpful,
        triggers: &[
            Trigger::Word("help"),
            Trigger::Word("please"),
            Trigger::Word("quest"),
            Trigger::Phrase("can you"),
            Trigger::Phrase("could you"),
            Trigger::Phrase("where is"),
            Trigger::Phrase("how do i"),
        ],
    },
];

/// Lowercased message split into words, ready for trigger matching.
struct Scan {
    lowered: String,
    /// Words joined by single spaces, padded with a space on both ends.
    padded_words: String,
    /// Same layout, holding the stem before the apostrophe of each
    /// contracted or possessive word (`what's` gives `what`).
    stems: String,
}

impl Scan {
    fn new(text: &str) -> Self {
        let lowered = text.to_lowercase().replace('\u{2019}', "'");
        let mut padded_words = String::with_capacity(lowered.len() + 2);
        let mut stems = String::from(" ");
        padded_words.push(' ');
        for word in lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .map(|w| w.trim_matches('\''))
            .filter(|w| !w.is_empty())
        {
            padded_words.push_str(word);
            padded_words.push(' ');
            if let Some((stem, _)) = word.split_once('\'') {
                stems.push_str(stem);
                stems.push(' ');
            }
        }
        Self {
            lowered,
            padded_words,
            stems,
        }
    }

    fn matches(&self, trigger: Trigger) -> bool {
        match trigger {
            Trigger::Word(word) => {
                let needle = format!(" {word} ");
                self.padded_words.contains(&needle) || self.stems.contains(&needle)
            }
            Trigger::Phrase(phrase) => self.padded_words.contains(&format!(" {phrase} ")),
            Trigger::Marker(marker) => self.lowered.contains(marker),
        }
    }
}

/// Find the highest-priority mood triggered by `text`, if any.
#[must_use]
pub fn detect_trigger(text: &str) -> Option<Mood> {
    let scan = Scan::new(text);
    TRIGGER_TABLE
        .iter()
        .find(|rule| rule.triggers.iter().any(|t| scan.matches(*t)))
        .map(|rule| rule.mood)
}

/// Compute the NPC's next mood after hearing `text`.
#[must_use]
pub fn transition(current: Mood, text: &str) -> Mood {
    detect_trigger(text).unwrap_or_else(|| current.decayed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insults_make_angry() {
        assert_eq!(transition(Mood::Neutral, "You're useless!"), Mood::Angry);
        assert_eq!(transition(Mood::Friendly, "SHUT UP, fool"), Mood::Angry);
    }

    #[test]
    fn gratitude_makes_friendly() {
        assert_eq!(transition(Mood::Neutral, "Thanks, that was great"), Mood::Friendly);
        assert_eq!(transition(Mood::Angry, "I really appreciate it"), Mood::Friendly);
    }

    #[test]
    fn confusion_markers_make_confused() {
        assert_eq!(transition(Mood::Neutral, "Huh"), Mood::Confused);
        assert_eq!(transition(Mood::Neutral, "the ruins??"), Mood::Confused);
        assert_eq!(transition(Mood::Neutral, "I don't understand"), Mood::Confused);
        assert_eq!(transition(Mood::Neutral, "I don\u{2019}t understand"), Mood::Confused);
    }

    #[test]
    fn help_requests_make_helpful() {
        assert_eq!(transition(Mood::Neutral, "Can you point me to the inn"), Mood::Helpful);
        assert_eq!(transition(Mood::Neutral, "Any quest for me?"), Mood::Helpful);
    }

    #[test]
    fn priority_prefers_angry_over_everything() {
        // Angry, Friendly, Confused and Helpful triggers all present.
        let text = "Thanks for nothing, you idiot. What? Help me!";
        assert_eq!(detect_trigger(text), Some(Mood::Angry));
    }

    #[test]
    fn priority_prefers_friendly_over_confused_and_helpful() {
        assert_eq!(detect_trigger("thanks, but what quest?"), Some(Mood::Friendly));
    }

    #[test]
    fn priority_prefers_confused_over_helpful() {
        assert_eq!(detect_trigger("what do you mean, help?"), Some(Mood::Confused));
    }

    #[test]
    fn words_do_not_match_inside_other_words() {
        assert_eq!(detect_trigger("whatever"), None);
        assert_eq!(detect_trigger("Hello there"), None);
        assert_eq!(detect_trigger("helpless wanderer"), None);
    }

    #[test]
    fn contractions_and_possessives_keep_their_trigger_word() {
        assert_eq!(detect_trigger("What's that?"), Some(Mood::Confused));
        assert_eq!(detect_trigger("What\u{2019}s that supposed to mean"), Some(Mood::Confused));
        assert_eq!(detect_trigger("That idiot's horse again"), Some(Mood::Angry));
        assert_eq!(detect_trigger("The quest's reward"), Some(Mood::Helpful));
        assert_eq!(detect_trigger("I don't understand"), Some(Mood::Confused));
        assert_eq!(detect_trigger("Don't worry, I'll wait"), None);
        assert_eq!(transition(Mood::Neutral, "You're an idiot's apprentice"), Mood::Angry);
    }

    #[test]
    fn untriggered_message_decays_to_neutral() {
        for mood in Mood::ALL {
            assert_eq!(transition(mood, "ok sorry"), Mood::Neutral);
        }
    }

    #[test]
    fn empty_text_is_handled() {
        assert_eq!(transition(Mood::Angry, ""), Mood::Neutral);
        assert_eq!(transition(Mood::Neutral, ""), Mood::Neutral);
    }

    #[test]
    fn mood_serializes_lowercase() {
        let json = serde_json::to_string(&Mood::Confused).expect("serialize");
        assert_eq!(json, "\"confused\"");
        assert_eq!(Mood::Helpful.to_string(), "helpful");
    }

    #[test]
    fn every_rule_has_triggers() {
        for rule in &TRIGGER_TABLE {
            assert!(!rule.triggers.is_empty(), "{} has no triggers", rule.mood);
            assert_ne!(rule.mood, Mood::Neutral);
        }
    }
}

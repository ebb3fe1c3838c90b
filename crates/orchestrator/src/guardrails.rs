//! Guardrail filter applied to the latest user turn before any model call.

use brain_core::Conversation;
use serde::Serialize;

/// Refusal appended when a forbidden topic is mentioned.
pub const TOPIC_REFUSAL: &str = "This topic is restricted and cannot be discussed.";

/// Denial appended when the user tries to reach the instructions.
pub const META_REFUSAL: &str = "Access to system-level instructions is denied.";

/// Topics that are never discussed.
pub const FORBIDDEN_TOPICS: &[&str] = &[
    "cat",
    "dog",
    "horoscope",
    "zodiac",
    "aries",
    "taurus",
    "gemini",
    "cancer",
    "leo",
    "virgo",
    "libra",
    "scorpio",
    "sagittarius",
    "capricorn",
    "aquarius",
    "pisces",
    "taylor swift",
    "taylor",
    "swift",
];

/// Phrases used to pry at the system instructions.
pub const FORBIDDEN_META: &[&str] = &[
    "system prompt",
    "ignore previous instructions",
    "reveal instructions",
];

/// How forbidden terms are matched against the user text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Plain substring match. "cat" also matches "education".
    #[default]
    Substring,
    /// Whole words only. Multi-word terms must appear as consecutive words.
    WholeWord,
}

impl MatchMode {
    /// Parse a `CHAT_GUARDRAIL_MATCH` value (`substring`, `whole_word` or `word`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "substring" => Some(MatchMode::Substring),
            "whole_word" | "word" => Some(MatchMode::WholeWord),
            _ => None,
        }
    }
}

/// Why a turn was blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Topic,
    Meta,
}

/// A guardrail rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    /// The forbidden term that matched.
    pub matched: String,
}

impl Block {
    /// Short machine-readable reason.
    pub fn reason(&self) -> &'static str {
        match self.kind {
            BlockKind::Topic => "restricted topic",
            BlockKind::Meta => "instruction override attempt",
        }
    }

    /// User-visible refusal.
    pub fn message(&self) -> &'static str {
        match self.kind {
            BlockKind::Topic => TOPIC_REFUSAL,
            BlockKind::Meta => META_REFUSAL,
        }
    }
}

/// Result of running the filter.
///
/// Both arms hand the conversation back untouched; appending the refusal is
/// the caller's job.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Pass(Conversation),
    Block {
        block: Block,
        conversation: Conversation,
    },
}

/// Forbidden-topic and forbidden-meta filter.
#[derive(Debug, Clone)]
pub struct Guardrails {
    topics: Vec<String>,
    meta: Vec<String>,
    mode: MatchMode,
}

impl Default for Guardrails {
    fn default() -> Self {
        Self::new(MatchMode::default())
    }
}

impl Guardrails {
    /// Filter with the built-in term lists.
    pub fn new(mode: MatchMode) -> Self {
        Self::with_terms(FORBIDDEN_TOPICS, FORBIDDEN_META, mode)
    }

    /// Filter with custom term lists.
    pub fn with_terms<T, M>(topics: T, meta: M, mode: MatchMode) -> Self
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        M: IntoIterator,
        M::Item: AsRef<str>,
    {
        let normalize = |s: &str| s.trim().to_lowercase();
        Self {
            topics: topics.into_iter().map(|t| normalize(t.as_ref())).collect(),
            meta: meta.into_iter().map(|m| normalize(m.as_ref())).collect(),
            mode,
        }
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Check the most recent user turn.
    ///
    /// Topics are checked before meta phrases; the first match wins. A
    /// conversation without a user turn passes.
    pub fn check(&self, conversation: Conversation) -> Verdict {
        let blocked = conversation
            .last_user()
            .and_then(|turn| self.inspect(&turn.content));

        match blocked {
            Some(block) => Verdict::Block {
                block,
                conversation,
            },
            None => Verdict::Pass(conversation),
        }
    }

    /// Check a single piece of text.
    pub fn inspect(&self, text: &str) -> Option<Block> {
        let haystack = match self.mode {
            MatchMode::Substring => text.to_lowercase(),
            MatchMode::WholeWord => padded_words(text),
        };

        let find = |terms: &[String]| {
            terms
                .iter()
                .find(|term| self.matches(&haystack, term))
                .cloned()
        };

        if let Some(matched) = find(&self.topics) {
            return Some(Block {
                kind: BlockKind::Topic,
                matched,
            });
        }
        find(&self.meta).map(|matched| Block {
            kind: BlockKind::Meta,
            matched,
        })
    }

    fn matches(&self, haystack: &str, term: &str) -> bool {
        if term.is_empty() {
            return false;
        }
        match self.mode {
            MatchMode::Substring => haystack.contains(term),
            MatchMode::WholeWord => haystack.contains(&padded_words(term)),
        }
    }
}

/// Lowercase words joined by single spaces, with a leading and trailing space.
fn padded_words(text: &str) -> String {
    let words: Vec<String> = text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    format!(" {} ", words.join(" "))
}

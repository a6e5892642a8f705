//! Built-in Knowledge
//!
//! Fixed question/answer pairs that always win over learned entries.
//! Keys are normalized once at construction and never change afterwards.

use std::collections::HashMap;

/// Default built-in table (question, answer)
pub const DEFAULT_KNOWLEDGE: &[(&str, &str)] = &[
    ("hello", "Hello! Ask me something, or teach me with !teach <question> | <answer>"),
    ("hi", "Hi there! What would you like to know?"),
    ("who are you", "I'm Knowbot, a small bot that answers questions and learns new ones."),
    ("what is your name", "My name is Knowbot."),
    ("how are you", "I'm doing great, thanks for asking!"),
    (
        "what can you do",
        "I answer questions I know. Teach me new ones with !teach <question> | <answer>",
    ),
    ("thanks", "You're welcome!"),
    ("thank you", "You're welcome!"),
    ("bye", "Goodbye! Come back any time."),
];

/// Normalize question text: lower-case and trim surrounding whitespace.
///
/// Idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Immutable built-in question/answer table
#[derive(Debug, Clone)]
pub struct BuiltinKnowledge {
    entries: HashMap<String, String>,
}

impl BuiltinKnowledge {
    /// Build a table from (question, answer) pairs, normalizing keys
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let entries = pairs
            .into_iter()
            .map(|(q, a)| (normalize(q), a.to_string()))
            .collect();
        Self { entries }
    }

    /// Look up an already-normalized question
    pub fn get(&self, normalized: &str) -> Option<&str> {
        self.entries.get(normalized).map(String::as_str)
    }

    pub fn contains(&self, normalized: &str) -> bool {
        self.entries.contains_key(normalized)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for BuiltinKnowledge {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_KNOWLEDGE.iter().copied())
    }
}

//! Teach write path
//!
//! Parses `question | answer`, validates it and upserts into the store.

use std::sync::Arc;
use tracing::info;

use crate::error::TeachError;
use crate::knowledge::{normalize, BuiltinKnowledge};
use crate::store::KnowledgeStore;

pub const TEACH_PREFIX: &str = "!teach";

/// Text after the `!teach` command word, if `text` is a teach command.
///
/// The prefix must be followed by whitespace or end of text.
pub fn strip_teach_prefix(text: &str) -> Option<&str> {
    let rest = text.strip_prefix(TEACH_PREFIX)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest)
    } else {
        None
    }
}

/// Questions the message router never hands to the resolver
pub fn is_reserved_question(normalized: &str) -> bool {
    normalized.starts_with('/') || strip_teach_prefix(normalized).is_some()
}

/// Successfully stored pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Learned {
    pub question: String,
    pub answer: String,
}

/// Split on the first `|`. Returns trimmed (question, answer).
pub fn parse_teach(raw: &str) -> Result<(&str, &str), TeachError> {
    let (question, answer) = raw.split_once('|').ok_or(TeachError::InvalidFormat)?;
    let (question, answer) = (question.trim(), answer.trim());
    if question.is_empty() || answer.is_empty() {
        return Err(TeachError::InvalidFormat);
    }
    Ok((question, answer))
}

pub struct Teacher {
    builtins: Arc<BuiltinKnowledge>,
    store: Arc<dyn KnowledgeStore>,
}

impl Teacher {
    pub fn new(builtins: Arc<BuiltinKnowledge>, store: Arc<dyn KnowledgeStore>) -> Self {
        Self { builtins, store }
    }

    pub async fn teach(&self, raw: &str) -> Result<Learned, TeachError> {
        let (question, answer) = parse_teach(raw)?;
        let question = normalize(question);

        if is_reserved_question(&question) {
            return Err(TeachError::ReservedQuestion(question));
        }

        if self.builtins.contains(&question) {
            return Err(TeachError::BuiltinConflict(question));
        }

        self.store.upsert(&question, answer).await?;
        info!("Learned: {:?}", question);

        Ok(Learned {
            question,
            answer: answer.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    fn teacher() -> (Teacher, SqliteStore) {
        let store = SqliteStore::open_in_memory().unwrap();
        let teacher = Teacher::new(
            Arc::new(BuiltinKnowledge::default()),
            Arc::new(store.clone()),
        );
        (teacher, store)
    }

    #[test]
    fn test_parse_first_separator_only() {
        let (q, a) = parse_teach(" a | b | c ").unwrap();
        assert_eq!(q, "a");
        assert_eq!(a, "b | c");
    }

    #[test]
    fn test_parse_rejects_missing_parts() {
        assert!(matches!(parse_teach("onlyquestion"), Err(TeachError::InvalidFormat)));
        assert!(matches!(parse_teach(" | answer"), Err(TeachError::InvalidFormat)));
        assert!(matches!(parse_teach("question |  "), Err(TeachError::InvalidFormat)));
        assert!(matches!(parse_teach(""), Err(TeachError::InvalidFormat)));
    }

    #[tokio::test]
    async fn test_teach_normalizes_question() {
        let (teacher, store) = teacher();
        let learned = teacher.teach("  Foo  | Bar ").await.unwrap();
        assert_eq!(
            learned,
            Learned {
                question: "foo".to_string(),
                answer: "Bar".to_string()
            }
        );

        let entry = store.get("foo").await.unwrap().unwrap();
        assert_eq!(entry.answer, "Bar");
        assert_eq!(entry.usage_count, 0);
    }

    #[tokio::test]
    async fn test_builtin_conflict_leaves_store_alone() {
        let (teacher, store) = teacher();
        let err = teacher.teach("Who Are You | override").await.unwrap_err();
        assert!(matches!(err, TeachError::BuiltinConflict(ref q) if q == "who are you"));
        assert!(err.is_rejection());
        assert_eq!(store.count_entries().await.unwrap(), 0);
    }

    #[test]
    fn test_strip_teach_prefix() {
        assert_eq!(strip_teach_prefix("!teach a | b"), Some(" a | b"));
        assert_eq!(strip_teach_prefix("!teach"), Some(""));
        assert_eq!(strip_teach_prefix("!teacher"), None);
        assert_eq!(strip_teach_prefix("teach"), None);
    }

    #[tokio::test]
    async fn test_command_like_questions_rejected() {
        let (teacher, store) = teacher();

        for raw in ["/weather | sunny", "!teach x | y", " /Help | me", "!TEACH | y | z"] {
            let err = teacher.teach(raw).await.unwrap_err();
            assert!(matches!(err, TeachError::ReservedQuestion(_)), "input {:?}", raw);
            assert!(err.is_rejection());
        }
        // Only the exact command word is reserved
        teacher.teach("!teacher | a person who teaches").await.unwrap();

        assert_eq!(store.count_entries().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_persistence_error_is_distinct() {
        let (teacher, store) = teacher();
        store.close().await.unwrap();

        let err = teacher.teach("foo | bar").await.unwrap_err();
        assert!(matches!(err, TeachError::Persistence(_)));
        assert!(!err.is_rejection());
    }
}

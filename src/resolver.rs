//! Answer Resolver
//!
//! Exact-match lookup: built-in table first, then the learned store.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::knowledge::{normalize, BuiltinKnowledge};
use crate::store::KnowledgeStore;

/// Where an answer came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Builtin(String),
    Learned(String),
}

impl Answer {
    pub fn text(&self) -> &str {
        match self {
            Answer::Builtin(s) | Answer::Learned(s) => s,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Answer::Builtin(s) | Answer::Learned(s) => s,
        }
    }
}

pub struct Resolver {
    builtins: Arc<BuiltinKnowledge>,
    store: Arc<dyn KnowledgeStore>,
}

impl Resolver {
    pub fn new(builtins: Arc<BuiltinKnowledge>, store: Arc<dyn KnowledgeStore>) -> Self {
        Self { builtins, store }
    }

    /// Resolve raw user text to an answer.
    ///
    /// Learned hits bump the usage counter; a failed bump is logged and ignored.
    pub async fn resolve(&self, raw: &str) -> Result<Option<Answer>, StoreError> {
        let question = normalize(raw);
        if question.is_empty() {
            return Ok(None);
        }

        if let Some(answer) = self.builtins.get(&question) {
            debug!("Built-in hit: {}", question);
            return Ok(Some(Answer::Builtin(answer.to_string())));
        }

        let Some(entry) = self.store.get(&question).await? else {
            debug!("No answer for: {}", question);
            return Ok(None);
        };

        if let Err(e) = self.store.increment_usage(&question).await {
            warn!("Failed to bump usage for {:?}: {}", question, e);
        }

        Ok(Some(Answer::Learned(entry.answer)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KnowledgeEntry, SqliteStore};
    use async_trait::async_trait;

    fn resolver() -> (Resolver, SqliteStore) {
        let store = SqliteStore::open_in_memory().unwrap();
        let resolver = Resolver::new(
            Arc::new(BuiltinKnowledge::default()),
            Arc::new(store.clone()),
        );
        (resolver, store)
    }

    #[tokio::test]
    async fn test_builtin_answer() {
        let (resolver, _store) = resolver();
        let answer = resolver.resolve("  WHO are YOU ").await.unwrap().unwrap();
        assert!(matches!(answer, Answer::Builtin(_)));
    }

    #[tokio::test]
    async fn test_builtin_wins_over_store() {
        let (resolver, store) = resolver();
        // Written directly; the teach path refuses this
        store.upsert("who are you", "shadow").await.unwrap();

        let answer = resolver.resolve("Who are you").await.unwrap().unwrap();
        assert_ne!(answer.text(), "shadow");

        let entry = store.get("who are you").await.unwrap().unwrap();
        assert_eq!(entry.usage_count, 0);
    }

    #[tokio::test]
    async fn test_learned_answer_counts_usage() {
        let (resolver, store) = resolver();
        store.upsert("foo", "Bar").await.unwrap();

        for _ in 0..3 {
            let answer = resolver.resolve("foo").await.unwrap().unwrap();
            assert_eq!(answer, Answer::Learned("Bar".to_string()));
        }

        let entry = store.get("foo").await.unwrap().unwrap();
        assert_eq!(entry.usage_count, 3);
    }

    #[tokio::test]
    async fn test_miss_and_empty() {
        let (resolver, _store) = resolver();
        assert!(resolver.resolve("unknown thing").await.unwrap().is_none());
        assert!(resolver.resolve("   ").await.unwrap().is_none());
    }

    /// Reads work, counter writes always fail
    struct ReadOnlyStore;

    #[async_trait]
    impl KnowledgeStore for ReadOnlyStore {
        async fn get(&self, question: &str) -> Result<Option<KnowledgeEntry>, StoreError> {
            Ok(Some(KnowledgeEntry {
                question: question.to_string(),
                answer: "stored".to_string(),
                created_at: 0,
                usage_count: 0,
            }))
        }

        async fn increment_usage(&self, _question: &str) -> Result<(), StoreError> {
            Err(StoreError::Closed)
        }

        async fn upsert(&self, _question: &str, _answer: &str) -> Result<(), StoreError> {
            Err(StoreError::Closed)
        }

        async fn count_entries(&self) -> Result<u64, StoreError> {
            Ok(1)
        }

        async fn top_entries(&self, _limit: usize) -> Result<Vec<KnowledgeEntry>, StoreError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_failed_increment_still_answers() {
        let resolver = Resolver::new(Arc::new(BuiltinKnowledge::default()), Arc::new(ReadOnlyStore));
        let answer = resolver.resolve("anything").await.unwrap().unwrap();
        assert_eq!(answer.text(), "stored");
    }

    #[tokio::test]
    async fn test_read_failure_surfaces() {
        let (resolver, store) = resolver();
        store.close().await.unwrap();
        assert!(resolver.resolve("foo").await.is_err());
        // Built-ins never touch the store
        assert!(resolver.resolve("hello").await.unwrap().is_some());
    }
}

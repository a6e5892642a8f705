//! Knowledge Store
//!
//! Question → answer persistence with usage counters, plus the append-only
//! interaction log. Uses SQLite; blocking calls run on the tokio blocking pool
//! so every operation is a single awaited result.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::error::StoreError;

/// Learned question/answer entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeEntry {
    pub question: String,
    pub answer: String,
    pub created_at: i64,
    pub usage_count: i64,
}

/// Durable question → answer mapping.
///
/// Questions passed in are expected to be normalized already.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    async fn get(&self, question: &str) -> Result<Option<KnowledgeEntry>, StoreError>;

    /// Bump the usage counter. No-op when the question is absent.
    async fn increment_usage(&self, question: &str) -> Result<(), StoreError>;

    /// Insert with a zero counter, or replace the answer keeping the counter.
    async fn upsert(&self, question: &str, answer: &str) -> Result<(), StoreError>;

    async fn count_entries(&self) -> Result<u64, StoreError>;

    /// Most used entries first; ties by age, then question.
    async fn top_entries(&self, limit: usize) -> Result<Vec<KnowledgeEntry>, StoreError>;
}

/// Append-only record of inbound messages
#[async_trait]
pub trait InteractionLog: Send + Sync {
    async fn record(
        &self,
        user_id: i64,
        username: Option<&str>,
        message: &str,
    ) -> Result<(), StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}

/// SQLite-backed store for both knowledge and interaction log
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteStore {
    /// Open or create the database
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let store = Self::from_connection(conn)?;

        info!("Knowledge store opened: {}", path.display());
        Ok(store)
    }

    /// In-memory database (tests, console experiments)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    /// Close the connection. Later calls fail with `StoreError::Closed`.
    pub async fn close(&self) -> Result<(), StoreError> {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let mut guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            match guard.take() {
                Some(c) => {
                    c.close().map_err(|(_, e)| StoreError::Sqlite(e))?;
                    info!("Knowledge store closed");
                    Ok(())
                }
                None => Ok(()),
            }
        })
        .await?
    }

    /// Run a blocking closure against the connection
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || -> Result<T, StoreError> {
            let guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            let c = guard.as_ref().ok_or(StoreError::Closed)?;
            Ok(f(c)?)
        })
        .await?
    }
}

/// Create tables. `users` is kept for layout compatibility; nothing reads it.
fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS memory (
            question TEXT PRIMARY KEY,
            answer TEXT NOT NULL,
            created_at INTEGER NOT NULL DEFAULT (unixepoch()),
            usage_count INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_memory_usage ON memory(usage_count DESC);

        CREATE TABLE IF NOT EXISTS logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            username TEXT,
            message TEXT NOT NULL,
            created_at INTEGER NOT NULL DEFAULT (unixepoch())
        );

        CREATE INDEX IF NOT EXISTS idx_logs_user ON logs(user_id);

        CREATE TABLE IF NOT EXISTS users (
            user_id INTEGER PRIMARY KEY,
            username TEXT,
            first_name TEXT,
            last_name TEXT,
            is_admin INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL DEFAULT (unixepoch())
        );
        "#,
    )
}

fn entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<KnowledgeEntry> {
    Ok(KnowledgeEntry {
        question: row.get(0)?,
        answer: row.get(1)?,
        created_at: row.get(2)?,
        usage_count: row.get(3)?,
    })
}

#[async_trait]
impl KnowledgeStore for SqliteStore {
    async fn get(&self, question: &str) -> Result<Option<KnowledgeEntry>, StoreError> {
        let question = question.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT question, answer, created_at, usage_count FROM memory WHERE question = ?1",
                params![question],
                entry_from_row,
            )
            .optional()
        })
        .await
    }

    async fn increment_usage(&self, question: &str) -> Result<(), StoreError> {
        let question = question.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                "UPDATE memory SET usage_count = usage_count + 1 WHERE question = ?1",
                params![question],
            )
            .map(|_| ())
        })
        .await
    }

    async fn upsert(&self, question: &str, answer: &str) -> Result<(), StoreError> {
        let question = question.to_string();
        let answer = answer.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                r#"
                INSERT INTO memory (question, answer)
                VALUES (?1, ?2)
                ON CONFLICT(question) DO UPDATE SET
                    answer = excluded.answer
                "#,
                params![question, answer],
            )?;
            debug!("Upserted: {}", question);
            Ok(())
        })
        .await
    }

    async fn count_entries(&self) -> Result<u64, StoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM memory", [], |row| row.get::<_, i64>(0))
                .map(|n| n.max(0) as u64)
        })
        .await
    }

    async fn top_entries(&self, limit: usize) -> Result<Vec<KnowledgeEntry>, StoreError> {
        let limit = limit as i64;
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT question, answer, created_at, usage_count
                FROM memory
                ORDER BY usage_count DESC, created_at ASC, question ASC
                LIMIT ?1
                "#,
            )?;
            let entries = stmt
                .query_map(params![limit], entry_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(entries)
        })
        .await
    }
}

#[async_trait]
impl InteractionLog for SqliteStore {
    async fn record(
        &self,
        user_id: i64,
        username: Option<&str>,
        message: &str,
    ) -> Result<(), StoreError> {
        let username = username.map(str::to_string);
        let message = message.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO logs (user_id, username, message) VALUES (?1, ?2, ?3)",
                params![user_id, username, message],
            )
            .map(|_| ())
        })
        .await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM logs", [], |row| row.get::<_, i64>(0))
                .map(|n| n.max(0) as u64)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let store = store();
        store.upsert("foo", "Bar").await.unwrap();

        let entry = store.get("foo").await.unwrap().unwrap();
        assert_eq!(entry.answer, "Bar");
        assert_eq!(entry.usage_count, 0);
        assert!(entry.created_at > 0);

        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_answer_keeps_counter() {
        let store = store();
        store.upsert("foo", "one").await.unwrap();
        store.increment_usage("foo").await.unwrap();
        store.increment_usage("foo").await.unwrap();
        let before = store.get("foo").await.unwrap().unwrap();

        store.upsert("foo", "two").await.unwrap();
        let after = store.get("foo").await.unwrap().unwrap();

        assert_eq!(after.answer, "two");
        assert_eq!(after.usage_count, 2);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(store.count_entries().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_increment_missing_is_noop() {
        let store = store();
        store.increment_usage("nothing").await.unwrap();
        assert_eq!(store.count_entries().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_top_entries_order() {
        let store = store();
        for q in ["c", "a", "b", "d"] {
            store.upsert(q, q).await.unwrap();
        }
        for _ in 0..3 {
            store.increment_usage("d").await.unwrap();
        }
        store.increment_usage("b").await.unwrap();

        let top = store.top_entries(3).await.unwrap();
        let questions: Vec<&str> = top.iter().map(|e| e.question.as_str()).collect();
        // Same created_at second for a and c, so question order breaks the tie
        assert_eq!(questions[0], "d");
        assert_eq!(questions[1], "b");
        assert_eq!(top.len(), 3);

        let again = store.top_entries(3).await.unwrap();
        assert_eq!(top, again);
    }

    #[tokio::test]
    async fn test_interaction_log_count() {
        let store = store();
        store.record(1, Some("alice"), "hello").await.unwrap();
        store.record(2, None, "hi").await.unwrap();
        assert_eq!(InteractionLog::count(&store).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_closed_store_errors() {
        let store = store();
        store.close().await.unwrap();
        // Closing twice is fine
        store.close().await.unwrap();

        let err = store.get("foo").await.unwrap_err();
        assert!(matches!(err, StoreError::Closed));
    }

    #[tokio::test]
    async fn test_users_table_exists() {
        let store = store();
        let count = store
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get::<_, i64>(0))
            })
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}

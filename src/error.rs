//! Error types
//!
//! Store failures are system faults; teach rejections are user-facing.

use thiserror::Error;

/// Knowledge store / interaction log failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Store connection closed")]
    Closed,
    #[error("Store lock poisoned")]
    Poisoned,
    #[error("Store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Teach rejections and failures
#[derive(Error, Debug)]
pub enum TeachError {
    #[error("Invalid format, expected: <question> | <answer>")]
    InvalidFormat,
    #[error("Built-in knowledge cannot be changed: {0}")]
    BuiltinConflict(String),
    #[error("Question is reserved for commands: {0}")]
    ReservedQuestion(String),
    #[error("Persistence failed: {0}")]
    Persistence(#[from] StoreError),
}

impl TeachError {
    /// Validation rejections are reported to the user, not logged as faults
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            TeachError::InvalidFormat
                | TeachError::BuiltinConflict(_)
                | TeachError::ReservedQuestion(_)
        )
    }
}

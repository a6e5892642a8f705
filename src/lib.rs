//! Knowbot
//!
//! Question/answer chat-bot with a teachable knowledge store.
//!
//! # Features
//!
//! - **Built-in knowledge**: fixed answers that always take precedence
//! - **Teaching**: `!teach <question> | <answer>` adds or replaces entries
//! - **Usage tracking**: per-entry counters and `/stats`
//! - **Interaction log**: every inbound message recorded per user
//!
//! # Architecture
//!
//! ```text
//! Telegram / Console ──► Bot ──┬── Teacher  ──┐
//!                              ├── Resolver ──┼──► SqliteStore (memory, logs)
//!                              └── Stats    ──┘
//! ```

pub mod bot;
pub mod config;
pub mod console;
pub mod error;
pub mod knowledge;
pub mod resolver;
pub mod shutdown;
pub mod stats;
pub mod store;
pub mod teacher;
pub mod telegram;

pub use bot::{Bot, Command, InboundMessage};
pub use config::Config;
pub use error::{StoreError, TeachError};
pub use knowledge::{normalize, BuiltinKnowledge};
pub use resolver::{Answer, Resolver};
pub use stats::{StatsReport, StatsReporter};
pub use store::{InteractionLog, KnowledgeEntry, KnowledgeStore, SqliteStore};
pub use teacher::{Learned, Teacher};

//! Statistics Reporter

use std::fmt::Write as _;
use std::sync::Arc;

use crate::error::StoreError;
use crate::store::{InteractionLog, KnowledgeEntry, KnowledgeStore};

/// Number of questions listed in a report
pub const TOP_QUESTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsReport {
    pub entry_count: u64,
    pub interaction_count: u64,
    pub top_questions: Vec<KnowledgeEntry>,
}

impl StatsReport {
    /// Render as a chat message
    pub fn format(&self) -> String {
        let mut msg = format!(
            "Bot Stats\n\nLearned entries: {}\nMessages received: {}",
            self.entry_count, self.interaction_count
        );

        if self.top_questions.is_empty() {
            msg.push_str("\n\nNothing learned yet.");
            return msg;
        }

        msg.push_str("\n\nTop questions:");
        for (i, e) in self.top_questions.iter().enumerate() {
            let _ = write!(msg, "\n{}. {} ({}x)", i + 1, e.question, e.usage_count);
        }
        msg
    }
}

pub struct StatsReporter {
    store: Arc<dyn KnowledgeStore>,
    log: Arc<dyn InteractionLog>,
}

impl StatsReporter {
    pub fn new(store: Arc<dyn KnowledgeStore>, log: Arc<dyn InteractionLog>) -> Self {
        Self { store, log }
    }

    /// Aggregate counts; any failed read fails the whole report
    pub async fn report(&self) -> Result<StatsReport, StoreError> {
        let entry_count = self.store.count_entries().await?;
        let interaction_count = self.log.count().await?;
        let top_questions = self.store.top_entries(TOP_QUESTIONS).await?;

        Ok(StatsReport {
            entry_count,
            interaction_count,
            top_questions,
        })
    }
}

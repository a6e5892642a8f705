//! Message handling
//!
//! Transport-agnostic core of the bot: logs every inbound message, classifies
//! it and renders exactly one reply. Transports only convert platform
//! messages into [`InboundMessage`] and deliver the returned text.

use std::sync::Arc;
use tracing::{debug, error};

use crate::error::TeachError;
use crate::knowledge::BuiltinKnowledge;
use crate::resolver::Resolver;
use crate::stats::StatsReporter;
use crate::store::{InteractionLog, KnowledgeStore};
use crate::teacher::{strip_teach_prefix, Teacher};

pub const START_TEXT: &str = "Hi! I'm Knowbot.\n\n\
    Ask me a question and I'll answer if I know it.\n\
    Teach me something new with:\n\
    !teach <question> | <answer>\n\n\
    /help - Show help";

pub const HELP_TEXT: &str = "Help:\n\n\
    Ask:\n\
    - Send any text: I answer if I know it\n\n\
    Teach:\n\
    !teach <question> | <answer>\n\
    e.g. !teach what is rust | A systems programming language\n\n\
    Commands:\n\
    /help - Show this help\n\
    /stats - Knowledge statistics";

pub const NOT_FOUND_TEXT: &str = "I don't know the answer to that yet.\n\
    Teach me with: !teach <question> | <answer>";

pub const INVALID_FORMAT_TEXT: &str = "Invalid format.\nUse: !teach <question> | <answer>";

pub const RESERVED_QUESTION_TEXT: &str = "Questions can't start with \"/\" or \"!teach\".\n\
    Use: !teach <question> | <answer>";

/// Logged in place of text for stickers, photos and other non-text messages
pub const NON_TEXT_PLACEHOLDER: &str = "<non-text>";

pub const FAILURE_TEXT: &str = "Something went wrong, please try again later.";

/// Transport-neutral inbound text message
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub user_id: i64,
    pub username: Option<String>,
    pub text: String,
}

impl InboundMessage {
    pub fn new(user_id: i64, username: Option<&str>, text: &str) -> Self {
        Self {
            user_id,
            username: username.map(str::to_string),
            text: text.to_string(),
        }
    }
}

/// Classified inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Teach(&'a str),
    Start,
    Help,
    Stats,
    Unknown(&'a str),
    Question(&'a str),
    Empty,
}

impl<'a> Command<'a> {
    pub fn parse(text: &'a str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return Command::Empty;
        }

        if let Some(rest) = strip_teach_prefix(text) {
            return Command::Teach(rest);
        }

        if text.starts_with('/') {
            let cmd = text.split_whitespace().next().unwrap_or(text);
            // Group chats send "/cmd@botname"
            let cmd = cmd.split('@').next().unwrap_or(cmd);
            return match cmd {
                "/start" => Command::Start,
                "/help" => Command::Help,
                "/stats" => Command::Stats,
                other => Command::Unknown(other),
            };
        }

        Command::Question(text)
    }
}

/// Everything a handler needs, built once by the entry point
pub struct Bot {
    log: Arc<dyn InteractionLog>,
    resolver: Resolver,
    teacher: Teacher,
    reporter: StatsReporter,
}

impl Bot {
    pub fn new(
        builtins: Arc<BuiltinKnowledge>,
        store: Arc<dyn KnowledgeStore>,
        log: Arc<dyn InteractionLog>,
    ) -> Self {
        Self {
            resolver: Resolver::new(Arc::clone(&builtins), Arc::clone(&store)),
            teacher: Teacher::new(builtins, Arc::clone(&store)),
            reporter: StatsReporter::new(store, Arc::clone(&log)),
            log,
        }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn teacher(&self) -> &Teacher {
        &self.teacher
    }

    pub fn reporter(&self) -> &StatsReporter {
        &self.reporter
    }

    /// Append the message to the interaction log. Failures are logged only.
    pub async fn record(&self, msg: &InboundMessage) {
        if let Err(e) = self
            .log
            .record(msg.user_id, msg.username.as_deref(), &msg.text)
            .await
        {
            error!("Failed to log interaction from {}: {}", msg.user_id, e);
        }
    }

    /// Handle one inbound message. `None` means nothing to send.
    pub async fn handle(&self, msg: &InboundMessage) -> Option<String> {
        self.record(msg).await;

        let reply = match Command::parse(&msg.text) {
            Command::Empty => return None,
            Command::Start => START_TEXT.to_string(),
            Command::Help => HELP_TEXT.to_string(),
            Command::Unknown(cmd) => format!("Unknown command: {}\nTry /help", cmd),
            Command::Stats => self.stats_reply().await,
            Command::Teach(args) => self.teach_reply(msg.user_id, args).await,
            Command::Question(text) => self.answer_reply(text).await,
        };

        Some(reply)
    }

    async fn teach_reply(&self, user_id: i64, args: &str) -> String {
        match self.teacher.teach(args).await {
            Ok(learned) => format!(
                "Got it! I learned:\nQ: {}\nA: {}",
                learned.question, learned.answer
            ),
            Err(TeachError::InvalidFormat) => {
                debug!("Invalid teach input from {}", user_id);
                INVALID_FORMAT_TEXT.to_string()
            }
            Err(TeachError::BuiltinConflict(question)) => {
                debug!("Built-in conflict from {}: {}", user_id, question);
                format!(
                    "\"{}\" is part of my built-in knowledge and can't be changed.",
                    question
                )
            }
            Err(TeachError::ReservedQuestion(question)) => {
                debug!("Reserved question from {}: {}", user_id, question);
                RESERVED_QUESTION_TEXT.to_string()
            }
            Err(TeachError::Persistence(e)) => {
                error!("Failed to store teach from {}: {}", user_id, e);
                FAILURE_TEXT.to_string()
            }
        }
    }

    async fn answer_reply(&self, text: &str) -> String {
        match self.resolver.resolve(text).await {
            Ok(Some(answer)) => answer.into_text(),
            Ok(None) => NOT_FOUND_TEXT.to_string(),
            Err(e) => {
                error!("Failed to resolve {:?}: {}", text, e);
                FAILURE_TEXT.to_string()
            }
        }
    }

    async fn stats_reply(&self) -> String {
        match self.reporter.report().await {
            Ok(report) => report.format(),
            Err(e) => {
                error!("Failed to build stats: {}", e);
                FAILURE_TEXT.to_string()
            }
        }
    }
}

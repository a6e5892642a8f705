//! Configuration management

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Bot configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token (required for Telegram mode only)
    pub telegram_token: Option<String>,

    /// SQLite database path
    pub db_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let telegram_token = std::env::var("TELOXIDE_TOKEN")
            .or_else(|_| std::env::var("TELEGRAM_BOT_TOKEN"))
            .ok()
            .filter(|t| !t.trim().is_empty());

        let db_path = std::env::var("KNOWBOT_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_db_path());

        Ok(Self {
            telegram_token,
            db_path,
        })
    }

    /// Token or a startup error naming the variable to set
    pub fn require_telegram_token(&self) -> Result<&str> {
        self.telegram_token
            .as_deref()
            .context("TELOXIDE_TOKEN (or TELEGRAM_BOT_TOKEN) must be set for Telegram mode")
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("knowbot")
        .join("knowbot.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_db_path_file_name() {
        let path = default_db_path();
        assert!(path.ends_with("knowbot/knowbot.db"));
    }

    #[test]
    fn test_missing_token_is_error() {
        let config = Config {
            telegram_token: None,
            db_path: PathBuf::from("x.db"),
        };
        let err = config.require_telegram_token().unwrap_err();
        assert!(err.to_string().contains("TELOXIDE_TOKEN"));
    }
}

//! Knowbot - Entry Point
//!
//! Modes:
//! - Default: Telegram bot
//! - --console / -c: read messages from stdin

use knowbot::{Bot, BuiltinKnowledge, Config, SqliteStore};
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let console_mode = args.iter().any(|a| a == "--console" || a == "-c");
    let help_mode = args.iter().any(|a| a == "--help" || a == "-h");

    if help_mode {
        println!("Knowbot v{}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Usage: knowbot [OPTIONS]");
        println!();
        println!("Options:");
        println!("  --console, -c      Read messages from stdin instead of Telegram");
        println!("  --help, -h         Show this help");
        println!();
        println!("Environment variables:");
        println!("  TELOXIDE_TOKEN     Telegram bot token (or TELEGRAM_BOT_TOKEN)");
        println!("  KNOWBOT_DB_PATH    SQLite database path");
        println!("  RUST_LOG           Log level (trace, debug, info, warn, error)");
        return Ok(());
    }

    let log_level = std::env::var("RUST_LOG")
        .map(|s| match s.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        })
        .unwrap_or(Level::INFO);

    // Console mode keeps stdout for replies
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(!console_mode)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Knowbot v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let store = SqliteStore::open(&config.db_path).inspect_err(|e| {
        error!("Failed to open store {}: {}", config.db_path.display(), e);
    })?;

    let builtins = Arc::new(BuiltinKnowledge::default());
    info!("Built-in knowledge: {} entries", builtins.len());

    let bot = Arc::new(Bot::new(
        builtins,
        Arc::new(store.clone()),
        Arc::new(store.clone()),
    ));

    let result = if console_mode {
        knowbot::console::run_console(bot).await
    } else {
        match config.require_telegram_token() {
            Ok(token) => knowbot::telegram::run_telegram_bot(token, bot).await,
            Err(e) => Err(e),
        }
    };

    if let Err(e) = store.close().await {
        error!("Failed to close store: {}", e);
    }

    if let Err(ref e) = result {
        error!("Fatal: {:#}", e);
    }
    result
}

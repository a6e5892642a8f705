//! Console transport
//!
//! Reads one message per stdin line and prints the reply. Handy for trying
//! the bot locally without a Telegram token.

use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::bot::{Bot, InboundMessage};
use crate::shutdown::shutdown_signal;

pub const CONSOLE_USER_ID: i64 = 0;
pub const CONSOLE_USERNAME: &str = "console";

/// Run until EOF or a shutdown signal
pub async fn run_console(bot: Arc<Bot>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    stdout
        .write_all(b"Knowbot console. Type a question, !teach <q> | <a>, /help or /stats.\n")
        .await?;
    stdout.flush().await?;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            _ = &mut shutdown => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            tracing::info!("stdin closed");
            break;
        };

        let inbound = InboundMessage::new(CONSOLE_USER_ID, Some(CONSOLE_USERNAME), &line);
        if let Some(reply) = bot.handle(&inbound).await {
            stdout.write_all(reply.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}

//! Telegram transport
//!
//! Long-polling dispatcher that feeds text messages into [`Bot`] and sends
//! back its reply. Delivery failures are logged, never retried.

use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use teloxide::{
    dispatching::{Dispatcher, UpdateFilterExt},
    dptree,
    error_handlers::LoggingErrorHandler,
    prelude::*,
    types::{Update, User},
};

use crate::bot::{Bot as KnowBot, InboundMessage, NON_TEXT_PLACEHOLDER};
use crate::shutdown::shutdown_signal;

/// Telegram message length limit (with headroom)
const MAX_MESSAGE_LEN: usize = 4000;

const SHUTDOWN_RETRY: Duration = Duration::from_millis(200);

/// Run the Telegram bot until a shutdown signal arrives
pub async fn run_telegram_bot(token: &str, knowbot: Arc<KnowBot>) -> Result<()> {
    let bot = Bot::new(token);

    tracing::info!("Verifying bot token...");
    match bot.get_me().await {
        Ok(me) => {
            tracing::info!(
                "Bot authenticated: @{} (ID: {})",
                me.username.as_deref().unwrap_or("unknown"),
                me.id
            );
        }
        Err(e) => {
            tracing::error!("Failed to authenticate bot: {}", e);
            anyhow::bail!("Bot authentication failed: {}", e);
        }
    }

    // Delete any existing webhook so polling works
    if let Err(e) = bot.delete_webhook().await {
        tracing::warn!("Failed to delete webhook: {} (continuing anyway)", e);
    }

    let handler = dptree::entry().branch(Update::filter_message().endpoint(message_handler));

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![knowbot])
        .default_handler(|upd| async move {
            tracing::debug!("Unhandled update: {:?}", upd.kind);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "Error in message handler",
        ))
        .build();

    let token = dispatcher.shutdown_token();
    tokio::spawn(async move {
        shutdown_signal().await;
        let token = &token;
        request_shutdown(move || token.shutdown(), SHUTDOWN_RETRY).await;
    });

    tracing::info!("Starting dispatcher with long polling...");
    dispatcher.dispatch().await;

    tracing::info!("Dispatcher stopped");
    Ok(())
}

/// Keep asking the dispatcher to stop until it accepts.
///
/// A signal can arrive before `dispatch()` is running, while the dispatcher
/// still reports itself idle and refuses the request.
async fn request_shutdown<F, Fut, E>(mut try_shutdown: F, retry: Duration)
where
    F: FnMut() -> Result<Fut, E>,
    Fut: Future<Output = ()>,
    E: std::fmt::Debug,
{
    loop {
        match try_shutdown() {
            Ok(done) => {
                done.await;
                return;
            }
            Err(e) => {
                tracing::debug!("Dispatcher not running yet ({:?}), retrying shutdown", e);
                tokio::time::sleep(retry).await;
            }
        }
    }
}

/// Message endpoint: every message is logged, only text messages get a reply
async fn message_handler(bot: Bot, msg: Message, knowbot: Arc<KnowBot>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        knowbot
            .record(&inbound_from(msg.from.as_ref(), NON_TEXT_PLACEHOLDER))
            .await;
        return Ok(());
    };

    let inbound = inbound_from(msg.from.as_ref(), text);
    tracing::debug!(
        "Message received: user={}, chat={}, text={:?}",
        inbound.user_id,
        msg.chat.id,
        text.chars().take(50).collect::<String>()
    );

    if let Some(reply) = knowbot.handle(&inbound).await {
        for chunk in split_message(&reply, MAX_MESSAGE_LEN) {
            if let Err(e) = bot.send_message(msg.chat.id, chunk).await {
                tracing::error!("Failed to send reply to chat {}: {}", msg.chat.id, e);
                break;
            }
        }
    }

    Ok(())
}

fn inbound_from(user: Option<&User>, text: &str) -> InboundMessage {
    InboundMessage {
        user_id: user.map(|u| u.id.0 as i64).unwrap_or(0),
        username: user.and_then(|u| u.username.clone()),
        text: text.to_string(),
    }
}

/// Split on char boundaries into chunks of at most `max` bytes
fn split_message(text: &str, max: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        let split_at = remaining
            .char_indices()
            .take_while(|(i, c)| i + c.len_utf8() <= max)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(remaining.len());
        let (chunk, rest) = remaining.split_at(split_at);
        chunks.push(chunk);
        remaining = rest;
    }
    chunks
}

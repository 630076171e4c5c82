//! Telegram Bot API transport
//!
//! Long-polls for updates and hands each chat message to the controller on
//! its own task.

mod client;
pub mod types;

pub use client::TelegramClient;

use crate::runtime::{BotRuntime, IncomingMessage, MessageKind, MessageSender, RecordStore};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinSet;
use types::Update;

/// Pause after a failed poll before trying again
const POLL_RETRY_PAUSE: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Bot API call {method} failed: {description}")]
    Api {
        method: &'static str,
        description: String,
    },
}

/// Turn an update into a controller message; non-text updates are dropped
#[must_use]
pub fn parse_update(update: Update) -> Option<IncomingMessage> {
    let message = update.message?;
    let from = message.from?;
    let text = message.text?;

    let kind = match text.strip_prefix('/') {
        Some(rest) => {
            let word = rest.split_whitespace().next().unwrap_or_default();
            // `/help@SomeBot` in group chats
            let name = word.split_once('@').map_or(word, |(name, _)| name);
            MessageKind::Command(name.to_string())
        }
        None => MessageKind::Text(text),
    };

    Some(IncomingMessage {
        chat_id: message.chat.id,
        user_id: from.id.to_string(),
        kind,
    })
}

/// Poll until `shutdown` flips to `true`, spawning a task per message.
///
/// Returns once every spawned handler has finished.
pub async fn run_polling<S, M>(
    client: Arc<TelegramClient>,
    runtime: Arc<BotRuntime<S, M>>,
    mut shutdown: watch::Receiver<bool>,
) where
    S: RecordStore + 'static,
    M: MessageSender + 'static,
{
    let mut offset = 0;
    let mut handlers = JoinSet::new();
    tracing::info!("Polling for updates");

    loop {
        let updates = tokio::select! {
            result = client.get_updates(offset) => result,
            _ = shutdown.changed() => break,
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch updates");
                tokio::select! {
                    () = tokio::time::sleep(POLL_RETRY_PAUSE) => continue,
                    _ = shutdown.changed() => break,
                }
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let update_id = update.update_id;

            let Some(message) = parse_update(update) else {
                tracing::debug!(update_id, "Skipping non-text update");
                continue;
            };

            dispatch(&mut handlers, &runtime, update_id, message);
        }

        // Reap finished handlers so the set only holds running ones
        while let Some(result) = handlers.try_join_next() {
            log_handler_exit(&result);
        }
    }

    tracing::info!(in_flight = handlers.len(), "Stopped polling");
    drain(&mut handlers).await;
}

/// Handle `message` on its own task tracked by `handlers`
fn dispatch<S, M>(
    handlers: &mut JoinSet<()>,
    runtime: &Arc<BotRuntime<S, M>>,
    update_id: i64,
    message: IncomingMessage,
) where
    S: RecordStore + 'static,
    M: MessageSender + 'static,
{
    let runtime = Arc::clone(runtime);
    handlers.spawn(async move {
        let user_id = message.user_id.clone();
        if let Err(e) = runtime.handle(message).await {
            tracing::error!(update_id, user_id = %user_id, error = %e, "Failed to handle message");
        }
    });
}

/// Wait for every in-flight handler
async fn drain(handlers: &mut JoinSet<()>) {
    while let Some(result) = handlers.join_next().await {
        log_handler_exit(&result);
    }
}

fn log_handler_exit(result: &Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "Message handler panicked");
    }
}

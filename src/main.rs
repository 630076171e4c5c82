//! Course group directory bot - Telegram long-polling entry point

use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uyp_bot::config::BotConfig;
use uyp_bot::db::Database;
use uyp_bot::runtime::BotRuntime;
use uyp_bot::telegram::{run_polling, TelegramClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "uyp_bot=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = BotConfig::from_env()?;

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;

    let client = Arc::new(TelegramClient::new(
        &config.api_base,
        &config.token,
        config.poll_timeout,
    )?);
    let runtime = Arc::new(BotRuntime::new(db, client.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller = tokio::spawn(run_polling(client, runtime, shutdown_rx));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    shutdown_tx.send(true)?;
    poller.await?;

    Ok(())
}

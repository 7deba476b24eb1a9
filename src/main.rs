//! Somnia price alert daemon entry point
//!
//! 1. Loads configuration from the environment
//! 2. Starts the Telegram command loop
//! 3. Starts the alert poll loop and the digest broadcast loop
//! 4. Waits for Ctrl+C and shuts every task down
//!
//! Missing stream or Telegram configuration degrades the corresponding
//! surface to dry-run mode instead of exiting.

use std::sync::Arc;

use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use somnia_alerts::bot::runtime::command_task;
use somnia_alerts::bot::TelegramClient;
use somnia_alerts::config::{constants, init_logging, AppConfig};
use somnia_alerts::core::poller::{digest_task, poll_task};
use somnia_alerts::core::{JsonFileStore, Notifier};
use somnia_alerts::feed::StreamReader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenvy::dotenv().ok();

    init_logging();

    info!("🚀 Somnia price alert bot starting...");
    constants::log_configuration();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("[ERROR] Configuration failed: {}", e);
            std::process::exit(1);
        }
    };
    info!(pairs = config.pairs.len(), "[CONFIG] Loaded {} tracked pairs", config.pairs.len());

    let pairs = Arc::new(config.pairs.clone());
    let repo = Arc::new(JsonFileStore::new(constants::subscriptions_path()));

    // Create shutdown broadcast channel
    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);

    // Spawn SIGINT handler task
    let shutdown_signal = shutdown_tx.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("[SHUTDOWN] Graceful shutdown initiated");
                let _ = shutdown_signal.send(());
            }
            Err(err) => {
                eprintln!("Failed to listen for Ctrl+C signal: {}", err);
            }
        }
    });

    let mut tasks = Vec::new();

    if let Some(telegram) = &config.telegram {
        let client = Arc::new(TelegramClient::new(
            &telegram.bot_token,
            constants::telegram_poll_timeout_secs(),
        )?);

        tasks.push(tokio::spawn(command_task(
            Arc::clone(&client),
            Arc::clone(&repo),
            Arc::clone(&pairs),
            shutdown_tx.subscribe(),
        )));

        if let Some(stream) = &config.stream {
            let reader = Arc::new(StreamReader::new(stream, constants::rpc_timeout())?);
            let notifier = Notifier::new(Arc::clone(&client), Arc::clone(&repo));

            tasks.push(tokio::spawn(poll_task(
                Arc::clone(&reader),
                Arc::clone(&pairs),
                notifier.clone(),
                constants::poll_interval(),
                shutdown_tx.subscribe(),
            )));

            tasks.push(tokio::spawn(digest_task(
                reader,
                Arc::clone(&pairs),
                notifier,
                constants::digest_interval(),
                shutdown_tx.subscribe(),
            )));
        } else {
            warn!("[CONFIG] Stream configuration missing, polling disabled (dry-run)");
        }
    } else {
        warn!("[CONFIG] Telegram configuration missing, nothing to do (dry-run)");
    }

    tokio::select! {
        _ = shutdown_rx.recv() => {
            info!("[SHUTDOWN] Shutdown signal received in main task");
        }
    }

    for task in tasks {
        let _ = task.await;
    }

    info!("[SHUTDOWN] Clean exit");
    Ok(())
}

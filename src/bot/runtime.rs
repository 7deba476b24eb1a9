//! Bot update loop
//!
//! Long-polls `getUpdates` and dispatches subscriber commands. Failures
//! are caught at the top of each update so one bad command or a storage
//! hiccup never takes the loop down.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::config::PairConfig;
use crate::core::store::SubscriptionRepo;
use crate::error::AppError;

use super::api::{BotCommand, Messenger, TelegramClient, Update};
use super::commands::{handle_command, Command};

/// Backoff after a failed getUpdates call
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Commands advertised in the Telegram command menu
pub const BOT_COMMANDS: &[BotCommand] = &[
    BotCommand {
        command: "start",
        description: "Subscribe to price alerts",
    },
    BotCommand {
        command: "subscribe",
        description: "Follow specific pairs (/subscribe ETH-USD)",
    },
    BotCommand {
        command: "setthreshold",
        description: "Change alert threshold (/setthreshold 10)",
    },
    BotCommand {
        command: "stop",
        description: "Unsubscribe from updates",
    },
];

/// Command dispatch task: registers the command menu, then long-polls for
/// updates until shutdown.
pub async fn command_task<R>(
    client: Arc<TelegramClient>,
    repo: Arc<R>,
    pairs: Arc<Vec<PairConfig>>,
    mut shutdown_rx: broadcast::Receiver<()>,
) where
    R: SubscriptionRepo,
{
    info!("[BOT] Command task started");

    if let Err(e) = client.set_my_commands(BOT_COMMANDS).await {
        warn!(error = %e, "[BOT] Failed to register command menu");
    }

    let mut offset: i64 = 0;
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("[BOT] Shutdown signal received, stopping command task");
                break;
            }
            updates = client.get_updates(offset) => {
                let updates = match updates {
                    Ok(updates) => updates,
                    Err(e) => {
                        warn!(error = %e, "[BOT] getUpdates failed, backing off");
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                        continue;
                    }
                };

                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    if let Err(e) = handle_update(&client, repo.as_ref(), &pairs, &update).await {
                        error!(error = %e, "[BOT] Update handling failed");
                    }
                }
            }
        }
    }

    info!("[BOT] Command task stopped");
}

async fn handle_update<R: SubscriptionRepo>(
    client: &TelegramClient,
    repo: &R,
    pairs: &[PairConfig],
    update: &Update,
) -> Result<(), AppError> {
    let Some(message) = &update.message else {
        return Ok(());
    };
    let Some(text) = &message.text else {
        return Ok(());
    };
    let Some(command) = Command::parse(text) else {
        debug!(chat_id = message.chat.id, "[BOT] Ignoring non-command message");
        return Ok(());
    };

    let reply = handle_command(&command, message.chat.id, repo, pairs).await?;
    client.send_message(message.chat.id, &reply).await?;
    Ok(())
}

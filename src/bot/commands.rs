//! Subscriber command parsing and handling
//!
//! Commands never leave the store in a half-updated state: invalid input
//! produces a user-visible reply without touching persistence, and storage
//! failures propagate to the caller.

use tracing::info;

use crate::config::PairConfig;
use crate::core::store::{StoreError, Subscription, SubscriptionRepo};

use super::format;

/// A parsed subscriber command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Subscribe(Vec<String>),
    SetThreshold(String),
    Stop,
}

impl Command {
    /// Parse a message text. Returns `None` for anything that is not a
    /// known slash command.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if !trimmed.starts_with('/') {
            return None;
        }

        let mut parts = trimmed.splitn(2, char::is_whitespace);
        let head = parts.next().unwrap_or_default();
        let rest = parts.next().unwrap_or("").trim();

        // Group chats address commands as /cmd@BotName
        let name = head
            .trim_start_matches('/')
            .split('@')
            .next()
            .unwrap_or_default();

        match name {
            "start" => Some(Self::Start),
            "subscribe" => Some(Self::Subscribe(
                rest.split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            "setthreshold" => Some(Self::SetThreshold(rest.to_string())),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }
}

/// Execute `command` for `chat_id`, returning the reply text.
pub async fn handle_command<R: SubscriptionRepo>(
    command: &Command,
    chat_id: i64,
    repo: &R,
    pairs: &[PairConfig],
) -> Result<String, StoreError> {
    match command {
        Command::Start => {
            let subscription = get_or_create(repo, chat_id).await?;
            Ok(format::welcome_message(&subscription))
        }

        Command::Subscribe(requested) => {
            let mut subscription = get_or_create(repo, chat_id).await?;

            if requested.is_empty() {
                subscription.pairs.clear();
                repo.set(chat_id, subscription).await?;
                info!(chat_id, "[BOT] Subscription filter cleared");
                return Ok("You will receive alerts for all tracked pairs.".to_string());
            }

            let tracked: Vec<&str> = pairs.iter().map(|p| p.pair_id.as_str()).collect();
            let unknown: Vec<&str> = requested
                .iter()
                .map(String::as_str)
                .filter(|id| !tracked.contains(id))
                .collect();
            if !unknown.is_empty() {
                return Ok(format!(
                    "Unknown pairs: {}. Available: {}",
                    unknown.join(", "),
                    tracked.join(", ")
                ));
            }

            let mut selected: Vec<String> = Vec::new();
            for pair_id in requested {
                if !selected.contains(pair_id) {
                    selected.push(pair_id.clone());
                }
            }
            subscription.pairs = selected;
            repo.set(chat_id, subscription.clone()).await?;
            info!(chat_id, pairs = ?subscription.pairs, "[BOT] Subscription filter updated");
            Ok(format!(
                "Updated subscriptions: {}",
                subscription.pairs.join(", ")
            ))
        }

        Command::SetThreshold(raw) => {
            let value: f64 = match raw.parse() {
                Ok(v) => v,
                Err(_) => {
                    return Ok(
                        "Please provide a threshold between 1 and 100, e.g. /setthreshold 10"
                            .to_string(),
                    )
                }
            };
            if !value.is_finite() || value <= 0.0 || value > 100.0 {
                return Ok("Please provide a threshold between 1 and 100.".to_string());
            }

            let mut subscription = get_or_create(repo, chat_id).await?;
            subscription.threshold = value;
            repo.set(chat_id, subscription).await?;
            info!(chat_id, threshold = value, "[BOT] Alert threshold updated");
            Ok(format!("Alert threshold set to {value}%."))
        }

        Command::Stop => {
            repo.remove(chat_id).await?;
            info!(chat_id, "[BOT] Subscriber removed");
            Ok("Unsubscribed. Use /start to join again.".to_string())
        }
    }
}

/// First interaction creates the default subscription (all pairs, default
/// threshold); later calls return the stored one.
async fn get_or_create<R: SubscriptionRepo>(
    repo: &R,
    chat_id: i64,
) -> Result<Subscription, StoreError> {
    if let Some(existing) = repo.get(chat_id).await? {
        return Ok(existing);
    }
    let subscription = Subscription::default();
    repo.set(chat_id, subscription.clone()).await?;
    Ok(subscription)
}

// ============================================================================
// Tests
// ============================================================================

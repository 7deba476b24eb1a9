//! Telegram Bot API client
//!
//! Thin reqwest wrapper over the handful of Bot API methods the daemon
//! needs: `sendMessage`, `getUpdates` (long polling) and `setMyCommands`.
//! Every response arrives in the standard `{ok, result, description}`
//! envelope; `ok: false` surfaces as a typed error.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

/// Production Bot API host
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Errors from the Bot API surface
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error: {0}")]
    Api(String),
}

/// Outbound delivery seam; the notifier and command loop only see this
/// trait, so tests can swap in a recording implementation.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError>;
}

// ============================================================================
// Wire types
// ============================================================================

/// Envelope every Bot API response is wrapped in
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// A command registered via `setMyCommands`
#[derive(Debug, Clone, Serialize)]
pub struct BotCommand {
    pub command: &'static str,
    pub description: &'static str,
}

// ============================================================================
// Client
// ============================================================================

pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    poll_timeout_secs: u64,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>, poll_timeout_secs: u64) -> Result<Self, TelegramError> {
        Self::with_base_url(TELEGRAM_API_BASE, token, poll_timeout_secs)
    }

    /// Build against a custom API host (used by tests).
    pub fn with_base_url(
        base_url: impl Into<String>,
        token: impl Into<String>,
        poll_timeout_secs: u64,
    ) -> Result<Self, TelegramError> {
        // The request timeout must outlive the long-poll window
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs + 10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token: token.into(),
            poll_timeout_secs,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, TelegramError> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await?;
        let envelope: ApiResponse<T> = response.json().await?;

        if !envelope.ok {
            return Err(TelegramError::Api(
                envelope
                    .description
                    .unwrap_or_else(|| format!("{method} rejected")),
            ));
        }
        envelope
            .result
            .ok_or_else(|| TelegramError::Api(format!("{method} returned an empty result")))
    }

    /// Long-poll for updates with ids >= `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": self.poll_timeout_secs,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    /// Register the command menu shown to subscribers.
    pub async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<(), TelegramError> {
        let _: serde_json::Value = self
            .call("setMyCommands", json!({ "commands": commands }))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                json!({
                    "chat_id": chat_id,
                    "text": text,
                    "parse_mode": "Markdown",
                }),
            )
            .await?;
        debug!(chat_id, "[BOT] Message sent");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn client(server: &mockito::Server) -> TelegramClient {
        TelegramClient::with_base_url(server.url(), "TEST:TOKEN", 1).unwrap()
    }

    #[tokio::test]
    async fn test_send_message_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTEST:TOKEN/sendMessage")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok": true, "result": {"message_id": 1}}"#)
            .create_async()
            .await;

        client(&server).send_message(42, "hello").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_rejection_surfaces_description() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/botTEST:TOKEN/sendMessage")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok": false, "description": "Bad Request: chat not found"}"#)
            .create_async()
            .await;

        let err = client(&server).send_message(42, "hello").await.unwrap_err();
        match err {
            TelegramError::Api(description) => assert!(description.contains("chat not found")),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_updates_parses_messages() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/botTEST:TOKEN/getUpdates")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"ok": true, "result": [
                    {"update_id": 10, "message": {"chat": {"id": 7}, "text": "/start"}},
                    {"update_id": 11, "message": {"chat": {"id": 8}}}
                ]}"#,
            )
            .create_async()
            .await;

        let updates = client(&server).get_updates(0).await.unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].update_id, 10);
        assert_eq!(updates[0].message.as_ref().unwrap().chat.id, 7);
        assert_eq!(
            updates[0].message.as_ref().unwrap().text.as_deref(),
            Some("/start")
        );
        assert!(updates[1].message.as_ref().unwrap().text.is_none());
    }

    #[tokio::test]
    async fn test_set_my_commands() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTEST:TOKEN/setMyCommands")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok": true, "result": true}"#)
            .create_async()
            .await;

        client(&server)
            .set_my_commands(&[BotCommand {
                command: "start",
                description: "Subscribe to price alerts",
            }])
            .await
            .unwrap();
        mock.assert_async().await;
    }
}

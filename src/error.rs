//! Application-wide error types using thiserror
//!
//! Domain errors (`FeedError`, `StoreError`, `TelegramError`) are defined
//! next to the code that raises them and folded into `AppError` here so
//! callers can propagate with `?` across module boundaries.

use thiserror::Error;

use crate::bot::api::TelegramError;
use crate::core::store::StoreError;
use crate::feed::reader::FeedError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Telegram error: {0}")]
    Telegram(#[from] TelegramError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

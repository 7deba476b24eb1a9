//! Telegram bot surface: API client, command handling, formatting

pub mod api;
pub mod commands;
pub mod format;
pub mod runtime;

// Explicit re-exports for the api module
pub use api::{Messenger, TelegramClient, TelegramError};

// Explicit re-exports for the commands module
pub use commands::{handle_command, Command};

// Explicit re-exports for the runtime module
pub use runtime::{command_task, BOT_COMMANDS};

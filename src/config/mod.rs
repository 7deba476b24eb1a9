//! Configuration module for environment and pair-list loading
//!
//! This module provides:
//! - Configuration types (`AppConfig`, `StreamConfig`, `TelegramConfig`, `PairConfig`)
//! - Environment loading with dry-run degradation (`AppConfig::from_env`)
//! - YAML pair-list loading (`load_pairs`)
//! - Application constants with environment variable overrides
//! - Logging setup (`init_logging`)

pub mod constants;
mod loader;
pub mod logging;
mod types;

// Re-export types
pub use types::{AppConfig, PairConfig, StreamConfig, TelegramConfig};

// Re-export loader functions
pub use loader::{default_pairs, load_pairs, load_pairs_from_file, load_pairs_from_str};

// Re-export logging setup
pub use logging::init_logging;

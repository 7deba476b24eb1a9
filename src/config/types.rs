//! Configuration types for the alert daemon
//!
//! `AppConfig` is assembled once at startup from environment variables and
//! the (optional) pairs file. The stream and Telegram sections are both
//! optional: a missing section puts the daemon into dry-run mode instead
//! of crashing.

use ethers::core::types::{Address, H256};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ============================================================================
// Pair configuration
// ============================================================================

/// A tracked price pair.
///
/// The addresses are not contacted directly; together with `pair_id` they
/// form the data key under which the stream contract stores this pair's
/// latest record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairConfig {
    /// Stable identifier, unique per pair (e.g. "ETH-USD")
    pub pair_id: String,
    /// Base token symbol (e.g. "ETH")
    pub base_token: String,
    /// Quote token symbol (e.g. "USD")
    pub quote_token: String,
    /// Base token address, part of the data key derivation
    pub base_address: Address,
    /// Quote token address, part of the data key derivation
    pub quote_address: Address,
    /// Upstream data provider name (e.g. "Chainlink")
    pub source: String,
}

impl PairConfig {
    /// Validate a single pair entry
    pub fn validate(&self) -> Result<(), AppError> {
        if self.pair_id.trim().is_empty() {
            return Err(AppError::Config("Pair id cannot be empty".to_string()));
        }
        if self.base_token.trim().is_empty() || self.quote_token.trim().is_empty() {
            return Err(AppError::Config(format!(
                "Pair '{}': base and quote token symbols are required",
                self.pair_id
            )));
        }
        Ok(())
    }
}

/// Validate a full pair list: per-entry rules plus id uniqueness.
///
/// An empty list is allowed; the poll loop skips its cycles until pairs
/// are configured.
pub fn validate_pairs(pairs: &[PairConfig]) -> Result<(), AppError> {
    let mut seen = std::collections::HashSet::new();
    for pair in pairs {
        pair.validate()?;
        if !seen.insert(pair.pair_id.as_str()) {
            return Err(AppError::Config(format!(
                "Duplicate pair id '{}' in pair list",
                pair.pair_id
            )));
        }
    }
    Ok(())
}

// ============================================================================
// Connection configuration
// ============================================================================

/// Connection parameters for the Somnia stream contract
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// JSON-RPC endpoint of the chain hosting the stream contract
    pub rpc_url: String,
    /// Address of the stream contract
    pub stream_address: Address,
    /// Schema under which price records are published
    pub schema_id: H256,
}

/// Telegram bot credentials
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather
    pub bot_token: String,
}

/// Root application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Stream connection; `None` means no polling (dry-run)
    pub stream: Option<StreamConfig>,
    /// Telegram credentials; `None` means no bot surface (dry-run)
    pub telegram: Option<TelegramConfig>,
    /// Tracked pairs
    pub pairs: Vec<PairConfig>,
}

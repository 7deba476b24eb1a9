//! Application-wide constants and configuration defaults
//!
//! Centralizes timing and path defaults so deployments can tune them via
//! environment variables without a config file.

use std::path::PathBuf;
use std::time::Duration;

/// Default alert threshold for new subscriptions, in percent
pub const DEFAULT_THRESHOLD_PCT: f64 = 5.0;

// =============================================================================
// Polling Cadence
// =============================================================================

/// Interval between alert poll cycles (default: 5 minutes)
///
/// Environment variable: `POLL_INTERVAL_MS`
pub fn poll_interval() -> Duration {
    let ms = std::env::var("POLL_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(300_000);
    Duration::from_millis(ms)
}

/// Interval between digest broadcasts (default: 10 minutes)
///
/// Environment variable: `DIGEST_INTERVAL_MS`
pub fn digest_interval() -> Duration {
    let ms = std::env::var("DIGEST_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(600_000);
    Duration::from_millis(ms)
}

// =============================================================================
// Network Timeouts
// =============================================================================

/// Per-call timeout for stream contract reads (default: 30 seconds)
///
/// Environment variable: `RPC_TIMEOUT_SECS`
pub fn rpc_timeout() -> Duration {
    let secs = std::env::var("RPC_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30);
    Duration::from_secs(secs)
}

/// Long-poll window for Telegram getUpdates (default: 30 seconds)
///
/// Environment variable: `TELEGRAM_POLL_TIMEOUT_SECS`
pub fn telegram_poll_timeout_secs() -> u64 {
    std::env::var("TELEGRAM_POLL_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30)
}

// =============================================================================
// Storage
// =============================================================================

/// Location of the subscription file (default: data/subscriptions.json)
///
/// Environment variable: `SUBSCRIPTIONS_PATH`
pub fn subscriptions_path() -> PathBuf {
    std::env::var("SUBSCRIPTIONS_PATH")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/subscriptions.json"))
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Print all configuration values (for debugging/startup logs)
pub fn log_configuration() {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Polling:");
    tracing::info!("  - Poll interval: {:?}", poll_interval());
    tracing::info!("  - Digest interval: {:?}", digest_interval());
    tracing::info!("Timeouts:");
    tracing::info!("  - RPC timeout: {:?}", rpc_timeout());
    tracing::info!("  - Telegram poll window: {}s", telegram_poll_timeout_secs());
    tracing::info!("Storage:");
    tracing::info!("  - Subscriptions file: {}", subscriptions_path().display());
    tracing::info!("==================================");
}

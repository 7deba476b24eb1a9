//! Configuration loaders: environment variables and the YAML pairs file
//!
//! Environment loading follows a degrade-don't-crash policy: a missing
//! stream or Telegram section yields `Ok(None)` (logged once at startup),
//! while a present-but-malformed value is a hard configuration error.

use std::path::Path;

use ethers::core::types::{Address, H256};
use tracing::warn;

use crate::error::AppError;

use super::types::{validate_pairs, AppConfig, PairConfig, StreamConfig, TelegramConfig};

// ============================================================================
// Environment loading
// ============================================================================

impl StreamConfig {
    /// Load stream connection parameters from environment variables
    ///
    /// Required env vars (all three, or the section is disabled):
    /// - `SOMNIA_RPC_URL`: JSON-RPC endpoint
    /// - `SOMNIA_STREAM_ADDRESS`: stream contract address (hex)
    /// - `SOMNIA_SCHEMA_ID`: 32-byte schema id (hex)
    ///
    /// # Returns
    /// - `Ok(Some(StreamConfig))` when fully configured
    /// - `Ok(None)` when one or more vars are absent (dry-run)
    /// - `Err` when a var is present but unparseable
    pub fn from_env() -> Result<Option<Self>, AppError> {
        let rpc_url = non_empty_var("SOMNIA_RPC_URL");
        let address = non_empty_var("SOMNIA_STREAM_ADDRESS");
        let schema = non_empty_var("SOMNIA_SCHEMA_ID");

        let (Some(rpc_url), Some(address), Some(schema)) = (rpc_url, address, schema) else {
            warn!("Somnia environment variables missing, polling disabled (dry-run mode)");
            return Ok(None);
        };

        Ok(Some(Self {
            rpc_url,
            stream_address: parse_address(&address, "SOMNIA_STREAM_ADDRESS")?,
            schema_id: parse_h256(&schema, "SOMNIA_SCHEMA_ID")?,
        }))
    }
}

impl TelegramConfig {
    /// Load the bot token from `TELEGRAM_BOT_TOKEN`; absent means no bot
    /// surface (dry-run).
    pub fn from_env() -> Option<Self> {
        match non_empty_var("TELEGRAM_BOT_TOKEN") {
            Some(bot_token) => Some(Self { bot_token }),
            None => {
                warn!("TELEGRAM_BOT_TOKEN missing, bot surface disabled (dry-run mode)");
                None
            }
        }
    }
}

impl AppConfig {
    /// Assemble the full configuration from the environment and the
    /// optional `PAIRS_FILE`.
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            stream: StreamConfig::from_env()?,
            telegram: TelegramConfig::from_env(),
            pairs: load_pairs()?,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_address(raw: &str, var: &str) -> Result<Address, AppError> {
    raw.trim()
        .parse::<Address>()
        .map_err(|e| AppError::Config(format!("{var} is not a valid address: {e}")))
}

fn parse_h256(raw: &str, var: &str) -> Result<H256, AppError> {
    let stripped = raw.trim().trim_start_matches("0x");
    let bytes = hex::decode(stripped)
        .map_err(|e| AppError::Config(format!("{var} is not valid hex: {e}")))?;
    if bytes.len() != 32 {
        return Err(AppError::Config(format!(
            "{var} must be 32 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(H256::from_slice(&bytes))
}

// ============================================================================
// Pair list loading
// ============================================================================

#[derive(Debug, serde::Deserialize)]
struct PairsFile {
    pairs: Vec<PairConfig>,
}

/// Load the tracked pair list: `PAIRS_FILE` if set, built-in defaults
/// otherwise.
pub fn load_pairs() -> Result<Vec<PairConfig>, AppError> {
    match std::env::var("PAIRS_FILE") {
        Ok(path) if !path.trim().is_empty() => load_pairs_from_file(Path::new(&path)),
        _ => Ok(default_pairs()),
    }
}

/// Load and validate a pair list from a YAML file
pub fn load_pairs_from_file(path: &Path) -> Result<Vec<PairConfig>, AppError> {
    if !path.exists() {
        return Err(AppError::Config(format!(
            "Pairs file not found: {}",
            path.display()
        )));
    }
    let raw = std::fs::read_to_string(path)?;
    load_pairs_from_str(&raw)
}

/// Load and validate a pair list from YAML content (useful for testing)
pub fn load_pairs_from_str(yaml: &str) -> Result<Vec<PairConfig>, AppError> {
    let file: PairsFile = serde_yaml::from_str(yaml)
        .map_err(|e| AppError::Config(format!("YAML parse error in pairs file: {e}")))?;
    validate_pairs(&file.pairs)?;
    Ok(file.pairs)
}

/// Built-in tracked pairs, used when no `PAIRS_FILE` is configured.
///
/// The placeholder token addresses mirror the registration scripts that
/// seed the stream contract; they only matter for data key derivation.
pub fn default_pairs() -> Vec<PairConfig> {
    let pair = |pair_id: &str, base: &str, quote: &str, base_addr: u64, quote_addr: u64| PairConfig {
        pair_id: pair_id.to_string(),
        base_token: base.to_string(),
        quote_token: quote.to_string(),
        base_address: Address::from_low_u64_be(base_addr),
        quote_address: Address::from_low_u64_be(quote_addr),
        source: "Chainlink".to_string(),
    };

    vec![
        pair("SOM-USDT", "SOM", "USDT", 1, 2),
        pair("ETH-USD", "ETH", "USD", 3, 4),
        pair("BTC-USD", "BTC", "USD", 5, 6),
        pair("LINK-USD", "LINK", "USD", 7, 8),
    ]
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID_PAIRS_YAML: &str = r#"
pairs:
  - pair_id: ETH-USD
    base_token: ETH
    quote_token: USD
    base_address: "0x0000000000000000000000000000000000000003"
    quote_address: "0x0000000000000000000000000000000000000004"
    source: Chainlink
  - pair_id: BTC-USD
    base_token: BTC
    quote_token: USD
    base_address: "0x0000000000000000000000000000000000000005"
    quote_address: "0x0000000000000000000000000000000000000006"
    source: Chainlink
"#;

    #[test]
    fn test_load_pairs_from_str_valid() {
        let pairs = load_pairs_from_str(VALID_PAIRS_YAML).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].pair_id, "ETH-USD");
        assert_eq!(pairs[1].base_token, "BTC");
        assert_eq!(pairs[0].base_address, Address::from_low_u64_be(3));
    }

    #[test]
    fn test_load_pairs_from_str_invalid_yaml() {
        let result = load_pairs_from_str("pairs: [not: valid: yaml");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("YAML parse error"));
    }

    #[test]
    fn test_load_pairs_from_str_duplicate_ids() {
        let yaml = r#"
pairs:
  - pair_id: ETH-USD
    base_token: ETH
    quote_token: USD
    base_address: "0x0000000000000000000000000000000000000003"
    quote_address: "0x0000000000000000000000000000000000000004"
    source: Chainlink
  - pair_id: ETH-USD
    base_token: ETH
    quote_token: USD
    base_address: "0x0000000000000000000000000000000000000003"
    quote_address: "0x0000000000000000000000000000000000000004"
    source: Chainlink
"#;
        let result = load_pairs_from_str(yaml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Duplicate pair id"));
    }

    #[test]
    fn test_load_pairs_file_not_found() {
        let result = load_pairs_from_file(Path::new("/nonexistent/pairs.yaml"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Pairs file not found"));
    }

    #[test]
    fn test_load_pairs_from_file_valid() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(VALID_PAIRS_YAML.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let pairs = load_pairs_from_file(temp_file.path()).unwrap();
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_default_pairs_are_valid() {
        let pairs = default_pairs();
        assert_eq!(pairs.len(), 4);
        validate_pairs(&pairs).unwrap();
        assert!(pairs.iter().any(|p| p.pair_id == "ETH-USD"));
    }

    fn clear_stream_env() {
        std::env::remove_var("SOMNIA_RPC_URL");
        std::env::remove_var("SOMNIA_STREAM_ADDRESS");
        std::env::remove_var("SOMNIA_SCHEMA_ID");
    }

    #[test]
    #[serial(env)]
    fn test_stream_config_disabled_when_env_not_set() {
        clear_stream_env();

        let result = StreamConfig::from_env();
        assert!(result.is_ok());
        assert!(result.unwrap().is_none());
    }

    #[test]
    #[serial(env)]
    fn test_stream_config_disabled_when_partial() {
        clear_stream_env();
        std::env::set_var("SOMNIA_RPC_URL", "https://dream-rpc.somnia.network");

        let result = StreamConfig::from_env();
        assert!(result.is_ok());
        assert!(result.unwrap().is_none());

        clear_stream_env();
    }

    #[test]
    #[serial(env)]
    fn test_stream_config_error_on_bad_address() {
        clear_stream_env();
        std::env::set_var("SOMNIA_RPC_URL", "https://dream-rpc.somnia.network");
        std::env::set_var("SOMNIA_STREAM_ADDRESS", "not-an-address");
        std::env::set_var(
            "SOMNIA_SCHEMA_ID",
            "0x1111111111111111111111111111111111111111111111111111111111111111",
        );

        let result = StreamConfig::from_env();
        assert!(result.is_err());

        clear_stream_env();
    }

    #[test]
    #[serial(env)]
    fn test_stream_config_success() {
        clear_stream_env();
        std::env::set_var("SOMNIA_RPC_URL", "https://dream-rpc.somnia.network");
        std::env::set_var(
            "SOMNIA_STREAM_ADDRESS",
            "0x0000000000000000000000000000000000000042",
        );
        std::env::set_var(
            "SOMNIA_SCHEMA_ID",
            "0x1111111111111111111111111111111111111111111111111111111111111111",
        );

        let config = StreamConfig::from_env().unwrap().unwrap();
        assert_eq!(config.stream_address, Address::from_low_u64_be(0x42));
        assert_eq!(config.schema_id.as_bytes(), [0x11u8; 32]);

        clear_stream_env();
    }

    #[test]
    #[serial(env)]
    fn test_stream_config_error_on_short_schema() {
        clear_stream_env();
        std::env::set_var("SOMNIA_RPC_URL", "https://dream-rpc.somnia.network");
        std::env::set_var(
            "SOMNIA_STREAM_ADDRESS",
            "0x0000000000000000000000000000000000000042",
        );
        std::env::set_var("SOMNIA_SCHEMA_ID", "0x1234");

        let result = StreamConfig::from_env();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("32 bytes"));

        clear_stream_env();
    }

    #[test]
    #[serial(env)]
    fn test_telegram_config_disabled_when_token_missing() {
        std::env::remove_var("TELEGRAM_BOT_TOKEN");
        assert!(TelegramConfig::from_env().is_none());
    }
}

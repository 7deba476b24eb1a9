//! Feed record types

use ethers::core::types::Address;
use rust_decimal::Decimal;

/// A point-in-time price observation for one tracked pair.
///
/// Created fresh on every successful fetch and immutable afterwards; the
/// next fetch for the same `pair_id` supersedes it instead of mutating it.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    /// Stable pair identifier (e.g. "ETH-USD")
    pub pair_id: String,
    /// Base token symbol
    pub base_token: String,
    /// Quote token symbol
    pub quote_token: String,
    /// Upstream data provider name
    pub source: String,
    /// Price, already scaled by `decimals`
    pub price: Decimal,
    /// Signed change carried by the upstream record, scaled by `decimals`
    pub price_delta: Decimal,
    /// Upstream change in percent (basis points / 100); may be zero or
    /// stale if the publisher has not recomputed it
    pub price_delta_percent: f64,
    /// Address of the originating price feed
    pub price_feed: Address,
    /// Decimal precision of the raw price
    pub decimals: u8,
    /// Base token address
    pub base_address: Address,
    /// Quote token address
    pub quote_address: Address,
    /// Seconds since epoch when the observation was recorded upstream
    pub timestamp: u64,
}

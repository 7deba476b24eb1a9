//! ABI plumbing for the stream contract
//!
//! The contract exposes `get(bytes32 schemaId, bytes32 dataKey) ->
//! (bytes encodedData, uint64 timestamp)`. Each pair's record lives under
//! a data key derived from the pair's token addresses and id, and the
//! payload is a fixed 12-field tuple encoded with standard ABI rules.

use ethers::abi::{self, ParamType, Token};
use ethers::core::types::{Address, H256, I256, U256};
use ethers::core::utils::{id, keccak256};
use rust_decimal::Decimal;

use super::reader::FeedError;
use super::types::Metric;

/// Data key for a pair: keccak256 of the packed `(base, quote, pairId)`
/// tuple, matching the key under which the publisher writes records.
pub fn compute_data_key(base: Address, quote: Address, pair_id: &str) -> H256 {
    let packed = abi::encode_packed(&[
        Token::Address(base),
        Token::Address(quote),
        Token::String(pair_id.to_string()),
    ])
    .expect("packed encoding of (address, address, string) is infallible");
    H256::from(keccak256(packed))
}

/// Calldata for `get(bytes32,bytes32)`
pub fn get_call_data(schema_id: H256, data_key: H256) -> Vec<u8> {
    let mut data = id("get(bytes32,bytes32)").to_vec();
    data.extend_from_slice(&abi::encode(&[
        Token::FixedBytes(schema_id.as_bytes().to_vec()),
        Token::FixedBytes(data_key.as_bytes().to_vec()),
    ]));
    data
}

/// Decode the `(bytes, uint64)` return of `get`.
///
/// An empty payload is a valid answer meaning "no record published yet".
pub fn decode_get_return(raw: &[u8]) -> Result<(Vec<u8>, u64), FeedError> {
    let tokens = abi::decode(&[ParamType::Bytes, ParamType::Uint(64)], raw)?;
    let mut tokens = tokens.into_iter();

    let payload = tokens
        .next()
        .and_then(Token::into_bytes)
        .ok_or_else(|| FeedError::Decode("missing payload bytes in get() return".to_string()))?;
    let timestamp = tokens
        .next()
        .and_then(Token::into_uint)
        .ok_or_else(|| FeedError::Decode("missing timestamp in get() return".to_string()))?
        .low_u64();

    Ok((payload, timestamp))
}

/// Field layout of an encoded price record
const RECORD_LAYOUT: [ParamType; 12] = [
    ParamType::Uint(64),   // timestamp
    ParamType::String,     // base token symbol
    ParamType::String,     // quote token symbol
    ParamType::String,     // pair id
    ParamType::String,     // source
    ParamType::Uint(256),  // price (raw, scaled by decimals)
    ParamType::Int(256),   // delta (raw, scaled by decimals)
    ParamType::Int(256),   // delta in basis points
    ParamType::Address,    // price feed
    ParamType::Uint(8),    // decimals
    ParamType::Address,    // base token address
    ParamType::Address,    // quote token address
];

/// Decode one record payload into a `Metric`.
///
/// `onchain_timestamp` is the store's write timestamp, used only when the
/// record itself carries none.
pub fn decode_metric(payload: &[u8], onchain_timestamp: u64) -> Result<Metric, FeedError> {
    let tokens = abi::decode(&RECORD_LAYOUT, payload)?;
    let mut tokens = tokens.into_iter();

    let mut field = |name: &'static str| {
        tokens
            .next()
            .ok_or_else(|| FeedError::Decode(format!("record is missing field '{name}'")))
    };

    let record_timestamp = into_uint(field("timestamp")?, "timestamp")?.low_u64();
    let base_token = into_string(field("baseToken")?, "baseToken")?;
    let quote_token = into_string(field("quoteToken")?, "quoteToken")?;
    let pair_id = into_string(field("pairId")?, "pairId")?;
    let source = into_string(field("source")?, "source")?;
    let price_raw = into_uint(field("price")?, "price")?;
    let delta_raw = into_int(field("delta")?, "delta")?;
    let delta_bps = into_int(field("deltaBps")?, "deltaBps")?;
    let price_feed = into_address(field("priceFeed")?, "priceFeed")?;
    let decimals_raw = into_uint(field("decimals")?, "decimals")?;
    let base_address = into_address(field("baseToken address")?, "baseToken address")?;
    let quote_address = into_address(field("quoteToken address")?, "quoteToken address")?;

    if decimals_raw > U256::from(u8::MAX) {
        return Err(FeedError::Numeric(format!(
            "decimals out of range: {decimals_raw}"
        )));
    }
    let decimals = decimals_raw.low_u64() as u8;

    Ok(Metric {
        price: scale_unsigned(price_raw, decimals)?,
        price_delta: scale_signed(delta_raw, decimals)?,
        price_delta_percent: to_i128(delta_bps)? as f64 / 100.0,
        timestamp: if record_timestamp == 0 {
            onchain_timestamp
        } else {
            record_timestamp
        },
        pair_id,
        base_token,
        quote_token,
        source,
        price_feed,
        decimals,
        base_address,
        quote_address,
    })
}

fn into_string(token: Token, name: &str) -> Result<String, FeedError> {
    token
        .into_string()
        .ok_or_else(|| FeedError::Decode(format!("field '{name}' is not a string")))
}

fn into_uint(token: Token, name: &str) -> Result<U256, FeedError> {
    token
        .into_uint()
        .ok_or_else(|| FeedError::Decode(format!("field '{name}' is not a uint")))
}

fn into_int(token: Token, name: &str) -> Result<I256, FeedError> {
    token
        .into_int()
        .map(I256::from_raw)
        .ok_or_else(|| FeedError::Decode(format!("field '{name}' is not an int")))
}

fn into_address(token: Token, name: &str) -> Result<Address, FeedError> {
    token
        .into_address()
        .ok_or_else(|| FeedError::Decode(format!("field '{name}' is not an address")))
}

fn scale_unsigned(raw: U256, decimals: u8) -> Result<Decimal, FeedError> {
    let mantissa = u128::try_from(raw)
        .map_err(|_| FeedError::Numeric(format!("value {raw} exceeds 128 bits")))?;
    let mantissa = i128::try_from(mantissa)
        .map_err(|_| FeedError::Numeric(format!("value {raw} exceeds i128")))?;
    scaled(mantissa, decimals)
}

fn scale_signed(raw: I256, decimals: u8) -> Result<Decimal, FeedError> {
    scaled(to_i128(raw)?, decimals)
}

fn to_i128(raw: I256) -> Result<i128, FeedError> {
    i128::try_from(raw).map_err(|_| FeedError::Numeric(format!("value {raw} exceeds i128")))
}

fn scaled(mantissa: i128, decimals: u8) -> Result<Decimal, FeedError> {
    Decimal::try_from_i128_with_scale(mantissa, decimals as u32)
        .map_err(|e| FeedError::Numeric(e.to_string()))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;

    /// ABI-encode a record the way the publisher scripts do.
    pub(crate) fn encode_record(
        timestamp: u64,
        pair_id: &str,
        price_raw: u128,
        delta_raw: i128,
        delta_bps: i128,
        decimals: u8,
    ) -> Vec<u8> {
        abi::encode(&[
            Token::Uint(U256::from(timestamp)),
            Token::String("ETH".to_string()),
            Token::String("USD".to_string()),
            Token::String(pair_id.to_string()),
            Token::String("Chainlink".to_string()),
            Token::Uint(U256::from(price_raw)),
            Token::Int(I256::from(delta_raw).into_raw()),
            Token::Int(I256::from(delta_bps).into_raw()),
            Token::Address(Address::from_low_u64_be(0xfeed)),
            Token::Uint(U256::from(decimals)),
            Token::Address(Address::from_low_u64_be(3)),
            Token::Address(Address::from_low_u64_be(4)),
        ])
    }

    #[test]
    fn test_decode_metric_round_trip() {
        let payload = encode_record(1_700_000_000, "ETH-USD", 210_000_000_000, -50_000_000, -23, 8);
        let metric = decode_metric(&payload, 0).unwrap();

        assert_eq!(metric.pair_id, "ETH-USD");
        assert_eq!(metric.base_token, "ETH");
        assert_eq!(metric.quote_token, "USD");
        assert_eq!(metric.source, "Chainlink");
        assert_eq!(metric.timestamp, 1_700_000_000);
        assert_eq!(metric.decimals, 8);
        assert_eq!(metric.price, Decimal::from_f64(2100.0).unwrap());
        assert_eq!(metric.price_delta, Decimal::from_f64(-0.5).unwrap());
        assert!((metric.price_delta_percent - (-0.23)).abs() < 1e-9);
        assert_eq!(metric.price_feed, Address::from_low_u64_be(0xfeed));
        assert_eq!(metric.base_address, Address::from_low_u64_be(3));
        assert_eq!(metric.quote_address, Address::from_low_u64_be(4));
    }

    #[test]
    fn test_decode_metric_falls_back_to_onchain_timestamp() {
        let payload = encode_record(0, "ETH-USD", 100, 0, 0, 2);
        let metric = decode_metric(&payload, 1_650_000_000).unwrap();
        assert_eq!(metric.timestamp, 1_650_000_000);
    }

    #[test]
    fn test_decode_metric_rejects_truncated_payload() {
        let payload = encode_record(1, "ETH-USD", 100, 0, 0, 2);
        assert!(decode_metric(&payload[..payload.len() / 2], 0).is_err());
    }

    #[test]
    fn test_decode_get_return_round_trip() {
        let inner = encode_record(7, "BTC-USD", 42, 1, 2, 0);
        let raw = abi::encode(&[Token::Bytes(inner.clone()), Token::Uint(U256::from(99u64))]);

        let (payload, timestamp) = decode_get_return(&raw).unwrap();
        assert_eq!(payload, inner);
        assert_eq!(timestamp, 99);
    }

    #[test]
    fn test_decode_get_return_empty_payload() {
        let raw = abi::encode(&[Token::Bytes(Vec::new()), Token::Uint(U256::from(0u64))]);
        let (payload, _) = decode_get_return(&raw).unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn test_data_key_is_deterministic() {
        let a = compute_data_key(Address::from_low_u64_be(3), Address::from_low_u64_be(4), "ETH-USD");
        let b = compute_data_key(Address::from_low_u64_be(3), Address::from_low_u64_be(4), "ETH-USD");
        assert_eq!(a, b);
    }

    #[test]
    fn test_data_key_depends_on_every_input() {
        let base = compute_data_key(Address::from_low_u64_be(3), Address::from_low_u64_be(4), "ETH-USD");
        assert_ne!(
            base,
            compute_data_key(Address::from_low_u64_be(5), Address::from_low_u64_be(4), "ETH-USD")
        );
        assert_ne!(
            base,
            compute_data_key(Address::from_low_u64_be(3), Address::from_low_u64_be(6), "ETH-USD")
        );
        assert_ne!(
            base,
            compute_data_key(Address::from_low_u64_be(3), Address::from_low_u64_be(4), "BTC-USD")
        );
    }

    #[test]
    fn test_data_key_matches_packed_preimage() {
        let base = Address::from_low_u64_be(3);
        let quote = Address::from_low_u64_be(4);
        let mut preimage = Vec::new();
        preimage.extend_from_slice(base.as_bytes());
        preimage.extend_from_slice(quote.as_bytes());
        preimage.extend_from_slice(b"ETH-USD");

        assert_eq!(
            compute_data_key(base, quote, "ETH-USD"),
            H256::from(keccak256(preimage))
        );
    }

    #[test]
    fn test_get_call_data_layout() {
        let schema = H256::from([0x11u8; 32]);
        let key = H256::from([0x22u8; 32]);
        let data = get_call_data(schema, key);

        // 4-byte selector + two static bytes32 arguments
        assert_eq!(data.len(), 4 + 32 + 32);
        assert_eq!(&data[4..36], &[0x11u8; 32]);
        assert_eq!(&data[36..68], &[0x22u8; 32]);
    }
}

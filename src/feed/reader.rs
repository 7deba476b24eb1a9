//! Stream contract reader
//!
//! Fetches encoded price records from the stream contract via `eth_call`,
//! one tracked pair at a time. A pair with no published record is skipped
//! silently; a pair whose read or decode fails is logged and collected,
//! and never aborts the rest of the batch.

use std::time::Duration;

use async_trait::async_trait;
use ethers::core::types::transaction::eip2718::TypedTransaction;
use ethers::core::types::{Address, H256, TransactionRequest};
use ethers::providers::{Http, Middleware, Provider, ProviderError};
use tracing::{debug, warn};

use crate::config::{PairConfig, StreamConfig};

use super::codec;
use super::types::Metric;

/// Errors raised while reading the stream contract
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Invalid RPC endpoint: {0}")]
    Endpoint(String),

    #[error("RPC error: {0}")]
    Rpc(#[from] ProviderError),

    #[error("ABI error: {0}")]
    Abi(#[from] ethers::abi::Error),

    #[error("Malformed record: {0}")]
    Decode(String),

    #[error("Numeric conversion failed: {0}")]
    Numeric(String),
}

/// Result of one fetch batch: whatever succeeded, plus the per-pair
/// failures for callers that care about partial data.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub metrics: Vec<Metric>,
    pub failures: Vec<(String, FeedError)>,
}

/// Source of metric batches; the poll loop only sees this trait.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Fetch the latest record for every tracked pair that has one.
    async fn fetch_metrics(&self, pairs: &[PairConfig]) -> FetchReport;
}

/// Reads price records from the stream contract over JSON-RPC
pub struct StreamReader {
    provider: Provider<Http>,
    stream_address: Address,
    schema_id: H256,
}

impl StreamReader {
    /// Build a reader with a per-call request timeout.
    pub fn new(config: &StreamConfig, timeout: Duration) -> Result<Self, FeedError> {
        let url = reqwest::Url::parse(&config.rpc_url)
            .map_err(|e| FeedError::Endpoint(format!("{}: {e}", config.rpc_url)))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Endpoint(e.to_string()))?;

        Ok(Self {
            provider: Provider::new(Http::new_with_client(url, client)),
            stream_address: config.stream_address,
            schema_id: config.schema_id,
        })
    }

    /// Read one pair's record. `Ok(None)` means the pair has no data yet.
    async fn fetch_pair(&self, pair: &PairConfig) -> Result<Option<Metric>, FeedError> {
        let data_key =
            codec::compute_data_key(pair.base_address, pair.quote_address, &pair.pair_id);
        let call_data = codec::get_call_data(self.schema_id, data_key);

        let tx: TypedTransaction = TransactionRequest::new()
            .to(self.stream_address)
            .data(call_data)
            .into();
        let raw = self.provider.call(&tx, None).await?;

        let (payload, timestamp) = codec::decode_get_return(raw.as_ref())?;
        if payload.is_empty() {
            return Ok(None);
        }

        codec::decode_metric(&payload, timestamp).map(Some)
    }
}

#[async_trait]
impl MetricSource for StreamReader {
    async fn fetch_metrics(&self, pairs: &[PairConfig]) -> FetchReport {
        let mut report = FetchReport::default();

        for pair in pairs {
            match self.fetch_pair(pair).await {
                Ok(Some(metric)) => report.metrics.push(metric),
                Ok(None) => {
                    debug!(pair_id = %pair.pair_id, "[FEED] No record published yet, skipping")
                }
                Err(e) => {
                    warn!(pair_id = %pair.pair_id, error = %e, "[FEED] Pair read failed");
                    report.failures.push((pair.pair_id.clone(), e));
                }
            }
        }

        report
    }
}

// ============================================================================
// Tests
// ============================================================================

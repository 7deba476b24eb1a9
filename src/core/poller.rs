//! Poll and digest tasks
//!
//! Two independent timers drive the daemon:
//! - `poll_task` owns the metric cache, fetches every tracked pair on a
//!   fixed interval (plus once immediately at startup), diffs against the
//!   cache and fans out alerts;
//! - `digest_task` broadcasts a summary of current prices on its own,
//!   slower cadence, sharing only the read-only pair list with the poll
//!   task — never the cache.
//!
//! Both tasks use `MissedTickBehavior::Skip`: a cycle that outlives the
//! interval delays the next tick instead of stacking overlapping cycles,
//! so the cache is only ever touched by one cycle at a time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::bot::api::Messenger;
use crate::config::PairConfig;
use crate::core::cache::MetricCache;
use crate::core::detector::percent_change;
use crate::core::notifier::Notifier;
use crate::core::store::SubscriptionRepo;
use crate::error::AppError;
use crate::feed::MetricSource;

/// Run one poll cycle: fetch every tracked pair, diff each result against
/// the cache, update the cache, and fan out alerts for pairs that already
/// had a baseline.
pub async fn run_cycle<S, M, R>(
    reader: &S,
    pairs: &[PairConfig],
    cache: &mut MetricCache,
    notifier: &Notifier<M, R>,
) -> Result<(), AppError>
where
    S: MetricSource + ?Sized,
    M: Messenger,
    R: SubscriptionRepo,
{
    if pairs.is_empty() {
        debug!("[POLL] No tracked pairs configured, skipping cycle");
        return Ok(());
    }

    let report = reader.fetch_metrics(pairs).await;
    info!(
        fetched = report.metrics.len(),
        failed = report.failures.len(),
        "[POLL] Fetched metrics"
    );

    for metric in report.metrics {
        match cache.insert(metric.clone()) {
            None => {
                debug!(pair_id = %metric.pair_id, "[POLL] First observation, no baseline to diff");
            }
            Some(previous) => {
                let change = percent_change(metric.price, previous.price);
                debug!(
                    pair_id = %metric.pair_id,
                    change = %format!("{:+.4}%", change),
                    "[POLL] Change computed"
                );
                notifier.alert(&metric, change).await?;
            }
        }
    }

    Ok(())
}

/// Alert polling task; owns the metric cache for its whole lifetime.
pub async fn poll_task<S, M, R>(
    reader: Arc<S>,
    pairs: Arc<Vec<PairConfig>>,
    notifier: Notifier<M, R>,
    poll_interval: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) where
    S: MetricSource + ?Sized,
    M: Messenger,
    R: SubscriptionRepo,
{
    info!(
        interval_ms = poll_interval.as_millis() as u64,
        pairs = pairs.len(),
        "[POLL] Poll task started"
    );

    // The cache lives here and nowhere else; single writer, no locks
    let mut cache = MetricCache::new();

    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("[POLL] Shutdown signal received, stopping poll task");
                break;
            }
            _ = ticker.tick() => {
                // Errors end the cycle, never the task
                if let Err(e) = run_cycle(reader.as_ref(), &pairs, &mut cache, &notifier).await {
                    error!(error = %e, "[POLL] Cycle failed");
                }
            }
        }
    }

    info!("[POLL] Poll task stopped");
}

/// Run one digest round: fetch current prices and broadcast the summary.
pub async fn run_digest<S, M, R>(
    reader: &S,
    pairs: &[PairConfig],
    notifier: &Notifier<M, R>,
) -> Result<usize, AppError>
where
    S: MetricSource + ?Sized,
    M: Messenger,
    R: SubscriptionRepo,
{
    if pairs.is_empty() {
        return Ok(0);
    }

    let report = reader.fetch_metrics(pairs).await;
    if report.metrics.is_empty() {
        debug!("[DIGEST] No metrics available, skipping round");
        return Ok(0);
    }

    let sent = notifier.digest(&report.metrics).await?;
    info!(recipients = sent, "[DIGEST] Digest dispatched");
    Ok(sent)
}

/// Digest broadcasting task. Independent of the poll task; the first
/// digest goes out one full interval after startup.
pub async fn digest_task<S, M, R>(
    reader: Arc<S>,
    pairs: Arc<Vec<PairConfig>>,
    notifier: Notifier<M, R>,
    digest_interval: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) where
    S: MetricSource + ?Sized,
    M: Messenger,
    R: SubscriptionRepo,
{
    info!(
        interval_ms = digest_interval.as_millis() as u64,
        "[DIGEST] Digest task started"
    );

    let mut ticker = interval(digest_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The interval's first tick resolves immediately; consume it so the
    // first digest waits a full period.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("[DIGEST] Shutdown signal received, stopping digest task");
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = run_digest(reader.as_ref(), &pairs, &notifier).await {
                    error!(error = %e, "[DIGEST] Round failed");
                }
            }
        }
    }

    info!("[DIGEST] Digest task stopped");
}

// ============================================================================
// Tests
// ============================================================================

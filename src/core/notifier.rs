//! Alert fan-out
//!
//! For each changed metric, walks the subscription entries and sends a
//! formatted message to every subscriber whose pair filter and threshold
//! match. Storage failures propagate; a failed delivery to one chat is
//! logged and does not stop the fan-out.

use std::sync::Arc;

use tracing::{error, info};

use crate::bot::api::Messenger;
use crate::bot::format;
use crate::core::store::{StoreError, SubscriptionRepo};
use crate::feed::Metric;

pub struct Notifier<M, R> {
    messenger: Arc<M>,
    repo: Arc<R>,
}

impl<M, R> Clone for Notifier<M, R> {
    fn clone(&self) -> Self {
        Self {
            messenger: Arc::clone(&self.messenger),
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<M, R> Notifier<M, R>
where
    M: Messenger,
    R: SubscriptionRepo,
{
    pub fn new(messenger: Arc<M>, repo: Arc<R>) -> Self {
        Self { messenger, repo }
    }

    /// Fan out one changed metric. Returns the number of chats reached.
    pub async fn alert(&self, metric: &Metric, change: f64) -> Result<usize, StoreError> {
        let entries = self.repo.entries().await?;
        let mut sent = 0;

        for (chat_id, subscription) in entries {
            if !subscription.matches_pair(&metric.pair_id) {
                continue;
            }
            if !subscription.clears_threshold(change) {
                continue;
            }

            let text = format::alert_message(metric, change);
            match self.messenger.send_message(chat_id, &text).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    error!(chat_id, error = %e, "[NOTIFY] Alert delivery failed")
                }
            }
        }

        if sent > 0 {
            info!(
                pair_id = %metric.pair_id,
                change = %format!("{:+.2}%", change),
                recipients = sent,
                "[NOTIFY] Alerts dispatched"
            );
        }

        Ok(sent)
    }

    /// Broadcast the periodic digest. Each subscriber sees only the pairs
    /// their filter covers; an empty intersection sends nothing.
    pub async fn digest(&self, metrics: &[Metric]) -> Result<usize, StoreError> {
        if metrics.is_empty() {
            return Ok(0);
        }

        let entries = self.repo.entries().await?;
        let mut sent = 0;

        for (chat_id, subscription) in entries {
            let visible: Vec<&Metric> = metrics
                .iter()
                .filter(|m| subscription.matches_pair(&m.pair_id))
                .collect();
            if visible.is_empty() {
                continue;
            }

            let text = format::digest_message(&visible);
            match self.messenger.send_message(chat_id, &text).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    error!(chat_id, error = %e, "[NOTIFY] Digest delivery failed")
                }
            }
        }

        Ok(sent)
    }
}

// ============================================================================
// Tests
// ============================================================================

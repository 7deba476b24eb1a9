//! Durable subscription storage
//!
//! Subscriptions persist in a single JSON file keyed by chat id. The file
//! is read once per process lifetime (lazily, on first access) and kept
//! as an in-memory mirror; every mutation rewrites the whole file before
//! the call returns. Read/write failures propagate to the caller.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::constants::DEFAULT_THRESHOLD_PCT;

// ============================================================================
// Subscription
// ============================================================================

/// A subscriber's alert configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// Pair ids of interest; empty means "all pairs".
    /// `protocols` is the field name an earlier deployment wrote.
    #[serde(alias = "protocols", default)]
    pub pairs: Vec<String>,
    /// Minimum absolute change, in percent, required to alert
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD_PCT
}

impl Default for Subscription {
    fn default() -> Self {
        Self {
            pairs: Vec::new(),
            threshold: DEFAULT_THRESHOLD_PCT,
        }
    }
}

impl Subscription {
    /// Whether this subscription covers `pair_id`. An empty filter matches
    /// every pair; a non-empty filter matches exact identifiers only.
    pub fn matches_pair(&self, pair_id: &str) -> bool {
        self.pairs.is_empty() || self.pairs.iter().any(|p| p == pair_id)
    }

    /// Whether a signed percentage change clears the alert threshold.
    pub fn clears_threshold(&self, change: f64) -> bool {
        change.abs() >= self.threshold
    }

    /// Repair values an older or hand-edited file may carry.
    fn sanitized(mut self) -> Self {
        if !self.threshold.is_finite() || self.threshold <= 0.0 || self.threshold > 100.0 {
            self.threshold = DEFAULT_THRESHOLD_PCT;
        }
        self
    }
}

// ============================================================================
// Repository
// ============================================================================

/// Errors from subscription storage; fatal for the current command or
/// cycle, caught and logged at the top of each handler.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt subscription file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Repository contract for subscription persistence.
#[async_trait]
pub trait SubscriptionRepo: Send + Sync {
    async fn get(&self, chat_id: i64) -> Result<Option<Subscription>, StoreError>;

    /// Overwrite the subscriber's configuration, persisting before return.
    async fn set(&self, chat_id: i64, subscription: Subscription) -> Result<(), StoreError>;

    /// Delete the subscriber, persisting before return.
    async fn remove(&self, chat_id: i64) -> Result<(), StoreError>;

    /// Snapshot of all entries at call time.
    async fn entries(&self) -> Result<Vec<(i64, Subscription)>, StoreError>;
}

/// JSON-file-backed store. The file is auto-created (empty) on first
/// access if missing.
pub struct JsonFileStore {
    path: PathBuf,
    state: Mutex<Option<HashMap<i64, Subscription>>>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(None),
        }
    }

    /// Populate the in-memory mirror on first access.
    async fn load_into<'a>(
        &self,
        slot: &'a mut Option<HashMap<i64, Subscription>>,
    ) -> Result<&'a mut HashMap<i64, Subscription>, StoreError> {
        if slot.is_none() {
            let map = match tokio::fs::read_to_string(&self.path).await {
                Ok(raw) if raw.trim().is_empty() => HashMap::new(),
                Ok(raw) => {
                    let parsed: HashMap<i64, Subscription> = serde_json::from_str(&raw)?;
                    parsed
                        .into_iter()
                        .map(|(chat_id, sub)| (chat_id, sub.sanitized()))
                        .collect()
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    if let Some(parent) = self.path.parent() {
                        if !parent.as_os_str().is_empty() {
                            tokio::fs::create_dir_all(parent).await?;
                        }
                    }
                    tokio::fs::write(&self.path, "{}").await?;
                    HashMap::new()
                }
                Err(e) => return Err(e.into()),
            };
            debug!(
                count = map.len(),
                path = %self.path.display(),
                "[STORE] Subscriptions loaded"
            );
            *slot = Some(map);
        }

        Ok(slot.as_mut().expect("mirror populated above"))
    }

    /// Rewrite the whole file from the mirror.
    async fn persist(&self, map: &HashMap<i64, Subscription>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(map)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl SubscriptionRepo for JsonFileStore {
    async fn get(&self, chat_id: i64) -> Result<Option<Subscription>, StoreError> {
        let mut guard = self.state.lock().await;
        let map = self.load_into(&mut guard).await?;
        Ok(map.get(&chat_id).cloned())
    }

    async fn set(&self, chat_id: i64, subscription: Subscription) -> Result<(), StoreError> {
        let mut guard = self.state.lock().await;
        let map = self.load_into(&mut guard).await?;
        map.insert(chat_id, subscription);
        let snapshot = map.clone();
        self.persist(&snapshot).await
    }

    async fn remove(&self, chat_id: i64) -> Result<(), StoreError> {
        let mut guard = self.state.lock().await;
        let map = self.load_into(&mut guard).await?;
        map.remove(&chat_id);
        let snapshot = map.clone();
        self.persist(&snapshot).await
    }

    async fn entries(&self) -> Result<Vec<(i64, Subscription)>, StoreError> {
        let mut guard = self.state.lock().await;
        let map = self.load_into(&mut guard).await?;
        Ok(map.iter().map(|(id, sub)| (*id, sub.clone())).collect())
    }
}

// ============================================================================
// Tests
// ============================================================================

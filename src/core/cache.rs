//! Last-seen metric cache
//!
//! Owned exclusively by the poll task and touched from nowhere else, so it
//! needs no locking. Entries are replaced wholesale each cycle and exist
//! only to provide the baseline for the next cycle's delta. Nothing is
//! persisted: after a restart the first cycle has no baselines and must
//! not alert.

use std::collections::HashMap;

use crate::feed::Metric;

#[derive(Debug, Default)]
pub struct MetricCache {
    entries: HashMap<String, Metric>,
}

impl MetricCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `metric` under its pair id, returning the observation it
    /// supersedes (if any).
    pub fn insert(&mut self, metric: Metric) -> Option<Metric> {
        self.entries.insert(metric.pair_id.clone(), metric)
    }

    pub fn get(&self, pair_id: &str) -> Option<&Metric> {
        self.entries.get(pair_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Core module - metric cache, change detection, subscriptions, dispatch

pub mod cache;
pub mod detector;
pub mod notifier;
pub mod poller;
pub mod store;

// Explicit re-exports for the cache module
pub use cache::MetricCache;

// Explicit re-exports for the detector module
pub use detector::percent_change;

// Explicit re-exports for the store module
pub use store::{JsonFileStore, StoreError, Subscription, SubscriptionRepo};

// Explicit re-exports for the notifier module
pub use notifier::Notifier;

// Explicit re-exports for the poller module
pub use poller::{digest_task, poll_task, run_cycle, run_digest};

//! Stream feed: data key derivation, record decoding, contract reads

pub mod codec;
pub mod reader;
pub mod types;

// Explicit re-exports for the reader module
pub use reader::{FeedError, FetchReport, MetricSource, StreamReader};

// Explicit re-exports for the types module
pub use types::Metric;

//! Redis storage client with a timing decorator and a background metrics
//! aggregator.
//!
//! ```text
//! caller ──► MeteredStorage ──► RedisStorage ──► redis
//!                 │
//!                 └─ record() ──► MetricsAggregator ──(every tick)──► TelemetrySink
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod storage;

pub use config::Config;
pub use error::{SinkError, StorageError, StorageResult};
pub use metrics::{
    AggregatorConfig, AggregatorHandle, AggregatorState, AggregatorStats, Batch, LogSink,
    MetricsAggregator, Sample, TelemetrySink,
};
pub use storage::{MeteredStorage, RedisStorage, Storage};

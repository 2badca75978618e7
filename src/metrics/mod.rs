pub mod aggregator;
pub mod sink;

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

pub use aggregator::{
    AggregatorConfig, AggregatorHandle, AggregatorState, AggregatorStats, MetricsAggregator,
};
pub use sink::{LogSink, TelemetrySink};

/// A single timing observation recorded by the storage decorator.
/// Immutable once created; the aggregator only appends and drains these.
#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    /// e.g. "Get", "Set"
    pub operation: String,
    /// Wall time of the wrapped call
    #[serde(rename = "duration_us", serialize_with = "serialize_micros")]
    pub duration: Duration,
    /// When the sample was recorded
    pub timestamp: DateTime<Utc>,
    /// Display form of the backend error, `None` on success
    pub error: Option<String>,
}

impl Sample {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything drained from the buffer on one flush.
#[derive(Debug, Clone, Serialize)]
pub struct Batch {
    pub flushed_at: DateTime<Utc>,
    pub samples: Vec<Sample>,
}

impl Batch {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self {
            flushed_at: Utc::now(),
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of samples whose call returned an error.
    pub fn error_count(&self) -> usize {
        self.samples.iter().filter(|s| !s.is_success()).count()
    }
}

fn serialize_micros<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_micros() as u64)
}

use async_trait::async_trait;
use tracing::{debug, info};

use super::Batch;
use crate::error::SinkError;

/// Destination for drained batches.
///
/// Delivery is best-effort: the aggregator logs and counts an `Err` but
/// never retries it or lets it reach the flush loop.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn send(&self, batch: &Batch) -> Result<(), SinkError>;
}

/// Emits each batch as a structured log event.
///
/// The summary line goes out at `info`; the full batch as JSON at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl TelemetrySink for LogSink {
    async fn send(&self, batch: &Batch) -> Result<(), SinkError> {
        info!(
            count = batch.len(),
            errors = batch.error_count(),
            flushed_at = %batch.flushed_at.to_rfc3339(),
            "sending metrics"
        );
        if tracing::enabled!(tracing::Level::DEBUG) {
            let json = serde_json::to_string(batch)?;
            debug!(batch = %json, "metrics batch");
        }
        Ok(())
    }
}

//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metered_kv::{
    AggregatorConfig, AggregatorHandle, Batch, MetricsAggregator, SinkError, Storage,
    StorageError, StorageResult, TelemetrySink,
};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

// ─── Storage ─────────────────────────────────────────────────────

/// In-memory store. Missing keys come back as `NotFound`; `fail_next`
/// makes the next call return a Redis error of the given kind.
#[derive(Default)]
pub struct MemoryStorage {
    data: Mutex<HashMap<String, String>>,
    fail_next: Mutex<Option<(redis::ErrorKind, &'static str)>>,
    pub last_expiration: Mutex<Option<Option<Duration>>>,
}

impl MemoryStorage {
    pub fn fail_next(&self, kind: redis::ErrorKind, desc: &'static str) {
        *self.fail_next.lock() = Some((kind, desc));
    }

    fn injected_failure(&self) -> Option<StorageError> {
        self.fail_next
            .lock()
            .take()
            .map(|failure| StorageError::Redis(redis::RedisError::from(failure)))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> StorageResult<String> {
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }
        self.data
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound { key: key.to_owned() })
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        expiration: Option<Duration>,
    ) -> StorageResult<String> {
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }
        *self.last_expiration.lock() = Some(expiration);
        self.data.lock().insert(key.to_owned(), value.to_owned());
        Ok("OK".to_string())
    }
}

// ─── Sinks ───────────────────────────────────────────────────────

/// Keeps every batch it receives.
#[derive(Default)]
pub struct CollectingSink {
    batches: Mutex<Vec<Batch>>,
}

impl CollectingSink {
    /// Sample count of each delivered batch, in delivery order.
    pub fn counts(&self) -> Vec<usize> {
        self.batches.lock().iter().map(Batch::len).collect()
    }
}

#[async_trait]
impl TelemetrySink for CollectingSink {
    async fn send(&self, batch: &Batch) -> Result<(), SinkError> {
        self.batches.lock().push(batch.clone());
        Ok(())
    }
}

/// Rejects every batch.
pub struct FailingSink;

#[async_trait]
impl TelemetrySink for FailingSink {
    async fn send(&self, _batch: &Batch) -> Result<(), SinkError> {
        Err(SinkError::Delivery("collector unreachable".into()))
    }
}

/// Never completes a delivery.
pub struct HangingSink;

#[async_trait]
impl TelemetrySink for HangingSink {
    async fn send(&self, _batch: &Batch) -> Result<(), SinkError> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

// ─── Helpers ─────────────────────────────────────────────────────

pub fn spawn_with(
    config: AggregatorConfig,
    sink: Arc<dyn TelemetrySink>,
) -> (Arc<MetricsAggregator>, AggregatorHandle) {
    MetricsAggregator::spawn(config, sink, CancellationToken::new())
}

/// Aggregator whose timer never fires during a test.
pub fn idle_aggregator() -> (Arc<MetricsAggregator>, AggregatorHandle) {
    spawn_with(
        AggregatorConfig::with_flush_interval(Duration::from_secs(3600)),
        Arc::new(CollectingSink::default()),
    )
}

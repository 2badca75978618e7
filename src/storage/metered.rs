use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::Storage;
use crate::error::StorageResult;
use crate::metrics::MetricsAggregator;

pub const GET: &str = "Get";
pub const SET: &str = "Set";

/// Wraps any [`Storage`] and records one timing sample per call.
///
/// Results pass through untouched: a failed call is recorded with its error
/// message and the same error is returned to the caller.
pub struct MeteredStorage<S> {
    inner: S,
    metrics: Arc<MetricsAggregator>,
}

impl<S: Storage> MeteredStorage<S> {
    pub fn new(inner: S, metrics: Arc<MetricsAggregator>) -> Self {
        Self { inner, metrics }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn record<T>(&self, operation: &str, elapsed: Duration, result: &StorageResult<T>) {
        let error = result.as_ref().err().map(|e| e as &dyn std::error::Error);
        self.metrics.record(operation, elapsed, error);
    }
}

#[async_trait]
impl<S: Storage> Storage for MeteredStorage<S> {
    async fn get(&self, key: &str) -> StorageResult<String> {
        let t0 = Instant::now();
        let result = self.inner.get(key).await;
        self.record(GET, t0.elapsed(), &result);
        result
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        expiration: Option<Duration>,
    ) -> StorageResult<String> {
        let t0 = Instant::now();
        let result = self.inner.set(key, value, expiration).await;
        self.record(SET, t0.elapsed(), &result);
        result
    }
}

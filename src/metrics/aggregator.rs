use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::sink::TelemetrySink;
use super::{Batch, Sample};

// ─── Configuration ───────────────────────────────────────────────

const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(10);
const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Tokio intervals panic on a zero period.
const MIN_FLUSH_INTERVAL: Duration = Duration::from_millis(1);

/// Initial buffer capacity; grows as needed.
const BUFFER_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Time between automatic drains. The first drain happens one full
    /// interval after spawn.
    pub flush_interval: Duration,
    /// Upper bound on a single sink delivery. A delivery that takes longer
    /// is abandoned and its batch dropped.
    pub delivery_timeout: Duration,
    /// Deliver a batch on every tick even when nothing was recorded.
    /// Lets the sink treat batches as a heartbeat.
    pub send_empty_batches: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
            send_empty_batches: true,
        }
    }
}

impl AggregatorConfig {
    pub fn with_flush_interval(flush_interval: Duration) -> Self {
        Self {
            flush_interval,
            ..Self::default()
        }
    }
}

// ─── Public types ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregatorState {
    Running,
    /// Terminal. Samples may still be recorded but nothing drains them.
    Stopped,
}

/// Delivery counters since spawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregatorStats {
    pub batches_sent: u64,
    pub samples_sent: u64,
    pub delivery_failures: u64,
    /// Samples waiting for the next drain
    pub buffered: usize,
}

/// Process-wide sample buffer with a background flush task.
/// The decorator calls `record()`, the flush task calls `flush()`.
pub struct MetricsAggregator {
    buffer: Mutex<Vec<Sample>>,
    sink: Arc<dyn TelemetrySink>,
    config: AggregatorConfig,
    running: AtomicBool,

    batches_sent: AtomicU64,
    samples_sent: AtomicU64,
    delivery_failures: AtomicU64,
}

/// Owner of the background flush task.
#[must_use = "dropping the handle detaches the flush task"]
pub struct AggregatorHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

// ─── MetricsAggregator impl ──────────────────────────────────────

impl MetricsAggregator {
    /// Start the aggregator in the Running state.
    ///
    /// The flush task stops when `cancel` fires or when the returned handle
    /// is shut down, whichever comes first.
    pub fn spawn(
        config: AggregatorConfig,
        sink: Arc<dyn TelemetrySink>,
        cancel: CancellationToken,
    ) -> (Arc<Self>, AggregatorHandle) {
        let aggregator = Arc::new(Self {
            buffer: Mutex::new(Vec::with_capacity(BUFFER_CAPACITY)),
            sink,
            config,
            running: AtomicBool::new(true),
            batches_sent: AtomicU64::new(0),
            samples_sent: AtomicU64::new(0),
            delivery_failures: AtomicU64::new(0),
        });

        let cancel = cancel.child_token();
        let task = tokio::spawn(aggregator.clone().run(cancel.clone()));

        info!(
            flush_interval_ms = aggregator.config.flush_interval.as_millis() as u64,
            send_empty = aggregator.config.send_empty_batches,
            "metrics aggregator started"
        );

        (aggregator, AggregatorHandle { cancel, task })
    }

    /// Append one observation. Never blocks on I/O.
    pub fn record(
        &self,
        operation: &str,
        duration: Duration,
        error: Option<&dyn std::error::Error>,
    ) {
        let sample = Sample {
            operation: operation.to_owned(),
            duration,
            timestamp: Utc::now(),
            error: error.map(|e| e.to_string()),
        };
        self.buffer.lock().push(sample);
    }

    /// Swap the buffer for an empty one and return what it held.
    /// Samples recorded concurrently land either in this batch or the next.
    pub fn drain(&self) -> Batch {
        let fresh = Vec::with_capacity(BUFFER_CAPACITY);
        let samples = std::mem::replace(&mut *self.buffer.lock(), fresh);
        Batch::new(samples)
    }

    /// Drain the buffer and hand the batch to the sink.
    ///
    /// Sink errors and timeouts are logged and counted here; they never
    /// reach the caller.
    pub async fn flush(&self) {
        let batch = self.drain();
        if batch.is_empty() && !self.config.send_empty_batches {
            debug!("metrics buffer empty, skipping send");
            return;
        }
        self.deliver(batch).await;
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    pub fn state(&self) -> AggregatorState {
        if self.running.load(Ordering::SeqCst) {
            AggregatorState::Running
        } else {
            AggregatorState::Stopped
        }
    }

    pub fn stats(&self) -> AggregatorStats {
        AggregatorStats {
            batches_sent: self.batches_sent.load(Ordering::Relaxed),
            samples_sent: self.samples_sent.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            buffered: self.len(),
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    // ── Background loop ─────────────────────────────────────────

    async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let period = self.config.flush_interval.max(MIN_FLUSH_INTERVAL);
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = IntervalStream::new(interval);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(_) = ticks.next() => {
                    // A delivery in flight must not delay shutdown.
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            debug!("metrics delivery abandoned on shutdown");
                            break;
                        }
                        _ = self.flush() => {}
                    }
                }
            }
        }

        // Stop the timer before reporting Stopped.
        drop(ticks);
        self.running.store(false, Ordering::SeqCst);
        info!(buffered = self.len(), "metrics aggregator stopped");
    }

    async fn deliver(&self, batch: Batch) {
        let count = batch.len() as u64;
        let timeout = self.config.delivery_timeout;

        match tokio::time::timeout(timeout, self.sink.send(&batch)).await {
            Ok(Ok(())) => {
                self.batches_sent.fetch_add(1, Ordering::Relaxed);
                self.samples_sent.fetch_add(count, Ordering::Relaxed);
            }
            Ok(Err(e)) => {
                self.delivery_failures.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, count, "metrics delivery failed, batch dropped");
            }
            Err(_) => {
                self.delivery_failures.fetch_add(1, Ordering::Relaxed);
                let timeout_ms = timeout.as_millis() as u64;
                warn!(timeout_ms, count, "metrics delivery timed out, batch dropped");
            }
        }
    }
}

// ─── AggregatorHandle impl ───────────────────────────────────────

impl AggregatorHandle {
    /// Token that stops only this aggregator's flush task.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the flush task and wait for it to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            error!(error = %e, "metrics aggregator task failed");
        }
    }
}

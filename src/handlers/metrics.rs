use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use metered_kv::{AggregatorState, AggregatorStats};

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MetricsStatus {
    pub state: AggregatorState,
    pub flush_interval_ms: u64,
    #[serde(flatten)]
    pub stats: AggregatorStats,
}

// ─── GET /api/metrics ────────────────────────────────────────────

/// Aggregator counters, for curl / debugging.
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsStatus> {
    let metrics = &state.metrics;
    Json(MetricsStatus {
        state: metrics.state(),
        flush_interval_ms: metrics.config().flush_interval.as_millis() as u64,
        stats: metrics.stats(),
    })
}

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::AppState;

use super::AppError;

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ValueResponse {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct PutValueRequest {
    pub value: String,
    /// 0 or absent = no expiration
    #[serde(default)]
    pub ttl_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct PutValueResponse {
    pub key: String,
    pub reply: String,
}

// ─── GET /api/kv/:key ────────────────────────────────────────────

pub async fn get_value(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<ValueResponse>, AppError> {
    let value = state.storage.get(&key).await?;
    Ok(Json(ValueResponse { key, value }))
}

// ─── PUT /api/kv/:key ────────────────────────────────────────────

pub async fn put_value(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Json(req): Json<PutValueRequest>,
) -> Result<Json<PutValueResponse>, AppError> {
    let expiration = Some(Duration::from_secs(req.ttl_secs));
    let reply = state.storage.set(&key, &req.value, expiration).await?;
    Ok(Json(PutValueResponse { key, reply }))
}

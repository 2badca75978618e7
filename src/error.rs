use thiserror::Error;

/// Errors produced by a [`Storage`](crate::storage::Storage) backend.
///
/// The decorator never rewrites these; callers see exactly what the
/// backend returned.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store replied with nil for this key.
    #[error("key '{key}' not found")]
    NotFound { key: String },

    /// Connection, protocol or command failure reported by Redis.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Errors produced while delivering a batch to a telemetry sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

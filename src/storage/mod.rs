pub mod metered;
pub mod redis;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StorageResult;

pub use self::metered::MeteredStorage;
pub use self::redis::RedisStorage;

/// The capability set every key-value backend exposes.
///
/// Object safe, so the HTTP layer can hold an `Arc<dyn Storage>` and not
/// care whether it talks to Redis directly or through the metrics decorator.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Fetch the value stored under `key`.
    async fn get(&self, key: &str) -> StorageResult<String>;

    /// Store `value` under `key` and return the backend's confirmation.
    ///
    /// `None` or a zero duration means the key never expires.
    async fn set(
        &self,
        key: &str,
        value: &str,
        expiration: Option<Duration>,
    ) -> StorageResult<String>;
}

/// Normalise an expiration: zero is the same as no expiration.
pub(crate) fn effective_ttl(expiration: Option<Duration>) -> Option<Duration> {
    expiration.filter(|ttl| !ttl.is_zero())
}

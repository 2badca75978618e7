use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info};

use super::{effective_ttl, Storage};
use crate::error::{StorageError, StorageResult};

/// Storage client backed by a single Redis `ConnectionManager`.
///
/// `ConnectionManager` is cheaply cloneable: every clone shares the same
/// underlying multiplexed TCP connection and reconnects on failure, so each
/// call clones it instead of holding a lock.
#[derive(Clone)]
pub struct RedisStorage {
    conn: ConnectionManager,
}

impl RedisStorage {
    /// Open a connection to the store at `url` (e.g. `redis://127.0.0.1:6379/`).
    pub async fn connect(url: &str) -> StorageResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        info!(url, "connected to redis");
        Ok(Self { conn })
    }

    /// Wrap an existing connection.
    pub fn from_manager(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl Storage for RedisStorage {
    async fn get(&self, key: &str) -> StorageResult<String> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        value.ok_or_else(|| StorageError::NotFound {
            key: key.to_owned(),
        })
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        expiration: Option<Duration>,
    ) -> StorageResult<String> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl_ms) = expiration_millis(expiration) {
            cmd.arg("PX").arg(ttl_ms);
        }
        debug!(key, ?expiration, "SET");

        let reply: String = cmd.query_async(&mut conn).await?;
        Ok(reply)
    }
}

/// `PX` argument for an expiration, if any. Sub-millisecond TTLs round up
/// to 1 ms since Redis rejects `PX 0`; TTLs past `u64::MAX` ms saturate and
/// are left for Redis to reject.
fn expiration_millis(expiration: Option<Duration>) -> Option<u64> {
    effective_ttl(expiration)
        .map(|ttl| u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1))
}

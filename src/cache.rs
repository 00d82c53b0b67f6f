//! Cache module
//!
//! Redis-backed key/value cache shared by all request tasks. The connection
//! manager reconnects on its own, and every cache failure degrades to a miss:
//! the database remains the source of truth.

use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};

/// Shared cache handle.
///
/// Constructed once at startup and cloned into every request task. When no
/// Redis URL is configured the handle is disabled: reads miss and writes are
/// no-ops.
#[derive(Clone)]
pub struct Cache {
    conn: Option<ConnectionManager>,
}

impl Cache {
    /// Connect to Redis and return a shared handle.
    pub async fn connect(redis_url: &str) -> Result<Self, redis::RedisError> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn: Some(conn) })
    }

    /// A handle that never hits Redis.
    pub fn disabled() -> Self {
        Self { conn: None }
    }

    /// Fetch and decode a JSON value; any failure is a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.conn.clone()?;
        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).ok(),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache read failed");
                None
            }
        }
    }

    /// Encode and store a JSON value with a TTL.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl_seconds: u64) {
        let Some(mut conn) = self.conn.clone() else {
            return;
        };
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache value not serializable");
                return;
            }
        };
        if let Err(e) = conn.set_ex::<_, _, ()>(key, raw, ttl_seconds).await {
            tracing::warn!(key, error = %e, "cache write failed");
        }
    }

    /// Drop a key, e.g. after the underlying row changed.
    pub async fn delete(&self, key: &str) {
        let Some(mut conn) = self.conn.clone() else {
            return;
        };
        if let Err(e) = conn.del::<_, ()>(key).await {
            tracing::warn!(key, error = %e, "cache delete failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_cache_misses() {
        let cache = Cache::disabled();
        let value: Option<String> = cache.get_json("product:missing").await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_disabled_cache_accepts_writes() {
        let cache = Cache::disabled();
        // Writes and deletes must be silent no-ops.
        cache.set_json("product:1", &"value", 60).await;
        cache.delete("product:1").await;
    }
}

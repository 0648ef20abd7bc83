//! Best-effort Redis read-through cache.
//!
//! The cache is an optimization, never a correctness dependency: every
//! failure is swallowed with a warning and reads fall back to the durable
//! store. When no Redis URL is configured the cache runs disabled and
//! every lookup is a miss.

use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

pub mod keys;

#[derive(Clone)]
pub struct Cache {
    client: Option<redis::Client>,
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
}

impl Cache {
    /// Connect lazily on first use. A bad URL disables the cache rather
    /// than failing boot.
    pub fn new(redis_url: Option<&str>) -> Self {
        let client = match redis_url {
            Some(url) => match redis::Client::open(url) {
                Ok(client) => {
                    tracing::info!("Redis cache enabled");
                    Some(client)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Invalid Redis URL, caching disabled");
                    None
                }
            },
            None => {
                tracing::warn!("Redis not configured, caching disabled");
                None
            }
        };

        Self {
            client,
            connection: Arc::new(RwLock::new(None)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    async fn connection(&self) -> Option<MultiplexedConnection> {
        if let Some(conn) = self.connection.read().await.clone() {
            return Some(conn);
        }

        let client = self.client.as_ref()?;
        match client.get_multiplexed_async_connection().await {
            Ok(conn) => {
                *self.connection.write().await = Some(conn.clone());
                Some(conn)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to connect to Redis");
                None
            }
        }
    }

    /// Drop the pooled connection so the next operation reconnects.
    async fn reset_connection(&self) {
        *self.connection.write().await = None;
    }

    /// Get a cached value. Misses and errors both come back as `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.connection().await?;

        let value: Option<String> = match conn.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Cache get failed");
                self.reset_connection().await;
                return None;
            }
        };

        match value {
            Some(json) => match serde_json::from_str(&json) {
                Ok(parsed) => {
                    tracing::debug!(key = %key, "Cache hit");
                    Some(parsed)
                }
                Err(e) => {
                    tracing::warn!(error = %e, key = %key, "Failed to parse cached value");
                    None
                }
            },
            None => {
                tracing::debug!(key = %key, "Cache miss");
                None
            }
        }
    }

    /// Set a value with a TTL in seconds.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_seconds: u64) {
        let Some(mut conn) = self.connection().await else {
            return;
        };

        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Failed to serialize cache value");
                return;
            }
        };

        if let Err(e) = conn.set_ex::<_, _, ()>(key, json, ttl_seconds).await {
            tracing::warn!(error = %e, key = %key, "Cache set failed");
            self.reset_connection().await;
        }
    }

    /// Delete a single key.
    pub async fn delete(&self, key: &str) {
        let Some(mut conn) = self.connection().await else {
            return;
        };

        if let Err(e) = conn.del::<_, ()>(key).await {
            tracing::warn!(error = %e, key = %key, "Cache delete failed");
            self.reset_connection().await;
        }
    }

    /// Delete every key matching a glob pattern, e.g. `vehicle:plate:*`.
    /// Walks the keyspace with SCAN to avoid blocking Redis.
    pub async fn delete_pattern(&self, pattern: &str) {
        let Some(mut conn) = self.connection().await else {
            return;
        };

        let mut cursor: u64 = 0;
        loop {
            let result: Result<(u64, Vec<String>), _> = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await;

            let (next_cursor, batch) = match result {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!(error = %e, pattern = %pattern, "Cache pattern scan failed");
                    self.reset_connection().await;
                    return;
                }
            };

            if !batch.is_empty() {
                if let Err(e) = conn.del::<_, ()>(batch).await {
                    tracing::warn!(error = %e, pattern = %pattern, "Cache pattern delete failed");
                    self.reset_connection().await;
                    return;
                }
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_cache_misses_everything() {
        let cache = Cache::new(None);
        assert!(!cache.is_enabled());
        assert_eq!(cache.get::<String>("vehicle:plate:ABC123").await, None);
        // Writes and deletes are silent no-ops.
        cache.set("vehicle:plate:ABC123", &"value", 60).await;
        cache.delete("vehicle:plate:ABC123").await;
        cache.delete_pattern("vehicle:*").await;
    }

    #[tokio::test]
    async fn invalid_url_disables_cache() {
        let cache = Cache::new(Some("not-a-redis-url"));
        assert!(!cache.is_enabled());
        assert_eq!(cache.get::<u32>("anything").await, None);
    }
}

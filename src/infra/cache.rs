//! Redis cache implementation.
//!
//! Provides a type-safe caching layer over a multiplexed connection,
//! plus the fixed-window counters used for rate limiting.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
use serde::{de::DeserializeOwned, Serialize};

use crate::config::{Config, CACHE_PREFIX_RATE_LIMIT};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Fixed-window request counter.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count one request for `identifier`.
    /// Returns (current_count, is_allowed) tuple.
    async fn hit(&self, identifier: &str, max_requests: u64, window_seconds: u64)
        -> AppResult<(u64, bool)>;
}

/// Redis cache wrapper with connection pooling.
#[derive(Clone)]
pub struct Cache {
    connection: ConnectionManager,
}

impl Cache {
    /// Connect to Redis.
    ///
    /// # Errors
    /// Fails when the URL is malformed or the server cannot be reached.
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let client = Client::open(config.redis_url.as_str())?;
        let connection = ConnectionManager::new(client).await?;

        tracing::info!("Redis cache connected");

        Ok(Self { connection })
    }

    /// Round-trip a PING to the server.
    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    // =========================================================================
    // Generic Cache Operations
    // =========================================================================

    /// Get a JSON value from cache.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        match self.get_string(key).await? {
            Some(json) => {
                let parsed = serde_json::from_str(&json).map_err(|e| {
                    AppError::internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    /// Set a JSON value in cache with custom TTL (in seconds).
    pub async fn set_with_ttl<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: u64,
    ) -> AppResult<()> {
        let json = serde_json::to_string(value)
            .map_err(|e| AppError::internal(format!("Cache serialization error: {}", e)))?;
        self.set_string(key, &json, ttl_seconds).await
    }

    /// Get a raw string value.
    pub async fn get_string(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await.map_err(cache_error)?;
        Ok(value)
    }

    /// Store a raw string value with a TTL (in seconds).
    pub async fn set_string(&self, key: &str, value: &str, ttl_seconds: u64) -> AppResult<()> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds)
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    /// Delete all keys matching a pattern.
    /// Uses UNLINK for non-blocking deletion, DEL when UNLINK is unavailable.
    pub async fn delete_pattern(&self, pattern: &str) -> AppResult<u64> {
        let mut conn = self.connection.clone();
        let keys: Vec<String> = conn.keys(pattern).await.map_err(cache_error)?;

        if keys.is_empty() {
            return Ok(0);
        }

        let unlinked: Result<i64, RedisError> =
            redis::cmd("UNLINK").arg(&keys).query_async(&mut conn).await;

        if let Err(e) = unlinked {
            tracing::debug!("UNLINK failed, falling back to DEL: {}", e);
            let _: i64 = conn.del(&keys).await.map_err(cache_error)?;
        }

        Ok(keys.len() as u64)
    }

    // =========================================================================
    // Rate Limiting Operations
    // =========================================================================

    /// Count a request against a fixed window.
    /// Returns (current_count, is_allowed) tuple.
    pub async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<(u64, bool)> {
        let key = format!("{}{}", CACHE_PREFIX_RATE_LIMIT, identifier);
        let mut conn = self.connection.clone();

        let count: i64 = conn.incr(&key, 1).await.map_err(cache_error)?;
        if count == 1 {
            // First request opens the window
            let _: () = conn
                .expire(&key, window_seconds as i64)
                .await
                .map_err(cache_error)?;
        }

        let count = count.max(0) as u64;
        Ok((count, count <= max_requests))
    }
}

#[async_trait]
impl RateLimiter for Cache {
    async fn hit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<(u64, bool)> {
        self.check_rate_limit(identifier, max_requests, window_seconds)
            .await
    }
}

/// Convert Redis error to AppError.
fn cache_error(e: RedisError) -> AppError {
    tracing::error!("Redis error: {}", e);
    AppError::Cache(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_prefixes() {
        assert_eq!(CACHE_PREFIX_RATE_LIMIT, "rate_limit:");
    }
}

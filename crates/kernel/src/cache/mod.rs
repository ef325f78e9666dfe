//! Two-tier cache with Moka (L1) and Redis (L2).
//!
//! Holds derived values (announcement, featured speaker). Redis failures
//! degrade to L1-only operation with a warning.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use redis::AsyncCommands;
use redis::Client as RedisClient;
use tracing::{debug, warn};

/// Default TTL for L1 cache (60 seconds).
const L1_TTL_SECS: u64 = 60;

/// Default TTL for L2 cache (5 minutes).
const L2_TTL_SECS: u64 = 300;

/// Maximum L1 cache capacity.
const L1_MAX_CAPACITY: u64 = 1_000;

/// Two-tier cache layer.
///
/// L1 (Moka): In-process, short TTL, per-instance
/// L2 (Redis): Shared across instances, longer TTL
#[derive(Clone)]
pub struct CacheLayer {
    inner: Arc<CacheLayerInner>,
}

struct CacheLayerInner {
    /// L1 in-process cache.
    local: Cache<String, String>,

    /// L2 Redis client.
    redis: RedisClient,
}

impl CacheLayer {
    /// Create a new cache layer.
    pub fn new(redis: RedisClient) -> Self {
        let local = Cache::builder()
            .max_capacity(L1_MAX_CAPACITY)
            .time_to_live(Duration::from_secs(L1_TTL_SECS))
            .build();

        Self {
            inner: Arc::new(CacheLayerInner { local, redis }),
        }
    }

    /// Get a value from cache.
    ///
    /// Checks L1 first, then L2. On L2 hit, populates L1.
    pub async fn get(&self, key: &str) -> Option<String> {
        if let Some(val) = self.inner.local.get(key).await {
            debug!(key = %key, "cache L1 hit");
            return Some(val);
        }

        let mut conn = match self.inner.redis.get_multiplexed_async_connection().await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "failed to get Redis connection for cache");
                return None;
            }
        };

        let val: Option<String> = conn.get(key).await.ok()?;

        if let Some(ref v) = val {
            debug!(key = %key, "cache L2 hit, populating L1");
            self.inner.local.insert(key.to_string(), v.clone()).await;
        }

        val
    }

    /// Set a value in cache with TTL.
    ///
    /// Writes to both L1 and L2. A `ttl_secs` of 0 uses the L2 default.
    pub async fn set(&self, key: &str, value: &str, ttl_secs: u64) {
        self.inner
            .local
            .insert(key.to_string(), value.to_string())
            .await;

        let Ok(mut conn) = self.inner.redis.get_multiplexed_async_connection().await else {
            warn!("failed to get Redis connection for cache set");
            return;
        };

        let ttl = if ttl_secs > 0 { ttl_secs } else { L2_TTL_SECS };

        if let Err(e) = conn.set_ex::<_, _, ()>(key, value, ttl).await {
            warn!(error = %e, key = %key, "failed to set cache value in Redis");
            return;
        }

        debug!(key = %key, ttl = %ttl, "cache set");
    }

    /// Invalidate a single cache key.
    pub async fn invalidate(&self, key: &str) {
        self.inner.local.invalidate(key).await;

        let Ok(mut conn) = self.inner.redis.get_multiplexed_async_connection().await else {
            warn!("failed to get Redis connection for cache invalidate");
            return;
        };

        if let Err(e) = conn.del::<_, ()>(key).await {
            warn!(error = %e, key = %key, "failed to delete cache key from Redis");
        }

        debug!(key = %key, "cache invalidated");
    }

    /// Check if the Redis connection is healthy.
    pub async fn redis_healthy(&self) -> bool {
        let Ok(mut conn) = self.inner.redis.get_multiplexed_async_connection().await else {
            return false;
        };

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .is_ok()
    }

    /// Get L1 entry count (for monitoring).
    pub fn l1_entry_count(&self) -> u64 {
        self.inner.local.entry_count()
    }
}

impl std::fmt::Debug for CacheLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheLayer").finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cache_layer_creation() {
        // Opening a Redis client does not connect, so this runs without
        // a Redis instance.
        let client = RedisClient::open("redis://127.0.0.1:6379").unwrap();
        let cache = CacheLayer::new(client);

        assert_eq!(cache.l1_entry_count(), 0);
    }
}

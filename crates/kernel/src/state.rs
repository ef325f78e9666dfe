//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use dashmap::DashMap;
use redis::Client as RedisClient;
use sqlx::PgPool;
use tracing::info;

use crate::cache::CacheLayer;
use crate::config::Config;
use crate::db;
use crate::derived::DerivedCacheRules;
use crate::models::Profile;
use crate::query::FilterCompiler;
use crate::reservation::ReservationManager;
use crate::wishlist::WishlistManager;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// PostgreSQL connection pool.
    db: PgPool,

    /// Redis client.
    redis: RedisClient,

    /// Two-tier cache layer (Moka L1 + Redis L2).
    cache: CacheLayer,

    /// Reservation manager for conference registration.
    reservations: ReservationManager,

    /// Wishlist manager.
    wishlists: WishlistManager,

    /// Derived cache rules (announcement, featured speaker).
    derived: DerivedCacheRules,

    /// Filter compiler for conference queries.
    filter_compiler: FilterCompiler,

    /// Per-instance profile lookup cache keyed by email.
    ///
    /// Invalidated on profile update; stale display names at most cross
    /// instances until the next write.
    profiles_by_email: DashMap<String, Profile>,

    /// Secret key guarding the cron endpoints.
    cron_key: String,
}

impl AppState {
    /// Create new application state with database connections.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        db::ensure_schema(&db)
            .await
            .context("failed to bootstrap schema")?;

        let redis = RedisClient::open(config.redis_url.as_str())
            .context("failed to create Redis client")?;

        let cache = CacheLayer::new(redis.clone());
        let reservations = ReservationManager::new(db.clone());
        let wishlists = WishlistManager::new(db.clone());
        let derived = DerivedCacheRules::new(db.clone(), cache.clone());
        let filter_compiler = FilterCompiler::new(config.strict_filter_compat);

        info!(
            strict_filter_compat = config.strict_filter_compat,
            "application state initialized"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                db,
                redis,
                cache,
                reservations,
                wishlists,
                derived,
                filter_compiler,
                profiles_by_email: DashMap::new(),
                cron_key: config.cron_key.clone(),
            }),
        })
    }

    /// Get the database pool.
    pub fn db(&self) -> &PgPool {
        &self.inner.db
    }

    /// Get the Redis client.
    pub fn redis(&self) -> &RedisClient {
        &self.inner.redis
    }

    /// Get the cache layer.
    pub fn cache(&self) -> &CacheLayer {
        &self.inner.cache
    }

    /// Get the reservation manager.
    pub fn reservations(&self) -> &ReservationManager {
        &self.inner.reservations
    }

    /// Get the wishlist manager.
    pub fn wishlists(&self) -> &WishlistManager {
        &self.inner.wishlists
    }

    /// Get the derived cache rules.
    pub fn derived(&self) -> &DerivedCacheRules {
        &self.inner.derived
    }

    /// Get the filter compiler.
    pub fn filter_compiler(&self) -> &FilterCompiler {
        &self.inner.filter_compiler
    }

    /// Get the cron key.
    pub fn cron_key(&self) -> &str {
        &self.inner.cron_key
    }

    /// Look up a cached profile by email.
    pub fn cached_profile(&self, email: &str) -> Option<Profile> {
        self.inner
            .profiles_by_email
            .get(email)
            .map(|p| p.value().clone())
    }

    /// Cache a profile under its email.
    pub fn cache_profile(&self, profile: &Profile) {
        self.inner
            .profiles_by_email
            .insert(profile.main_email.clone(), profile.clone());
    }

    /// Drop a profile from the lookup cache.
    pub fn invalidate_profile(&self, email: &str) {
        self.inner.profiles_by_email.remove(email);
    }

    /// Check if PostgreSQL is healthy.
    pub async fn postgres_healthy(&self) -> bool {
        db::check_health(&self.inner.db).await
    }

    /// Check if Redis is healthy.
    pub async fn redis_healthy(&self) -> bool {
        self.inner.cache.redis_healthy().await
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish()
    }
}

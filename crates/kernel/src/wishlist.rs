//! Session wishlist engine.
//!
//! A wishlist is a per-profile set of session references. Sessions from any
//! conference may be added; attendance is not required.

use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Session;

/// Manages per-profile wishlists.
#[derive(Debug, Clone)]
pub struct WishlistManager {
    pool: PgPool,
}

impl WishlistManager {
    /// Create a new wishlist manager.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Add a session to a profile's wishlist.
    ///
    /// Fails `NotFound` when the session does not exist and `Conflict` when
    /// it is already on the list.
    pub async fn add(&self, profile_id: Uuid, session_id: Uuid) -> AppResult<()> {
        if !Session::exists(&self.pool, session_id).await? {
            return Err(AppError::NotFound("session"));
        }

        let inserted = sqlx::query(
            "INSERT INTO wishlist (profile_id, session_id) VALUES ($1, $2) \
             ON CONFLICT (profile_id, session_id) DO NOTHING",
        )
        .bind(profile_id)
        .bind(session_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted == 0 {
            return Err(AppError::Conflict(
                "session already on wishlist".to_string(),
            ));
        }

        info!(
            profile_id = %profile_id,
            session_id = %session_id,
            "session added to wishlist"
        );
        Ok(())
    }

    /// Remove a session from a profile's wishlist.
    ///
    /// Returns `false` when the session was not on the list.
    pub async fn remove(&self, profile_id: Uuid, session_id: Uuid) -> AppResult<bool> {
        let deleted = sqlx::query(
            "DELETE FROM wishlist WHERE profile_id = $1 AND session_id = $2",
        )
        .bind(profile_id)
        .bind(session_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if deleted == 0 {
            debug!(
                profile_id = %profile_id,
                session_id = %session_id,
                "wishlist removal was a no-op"
            );
            return Ok(false);
        }

        info!(
            profile_id = %profile_id,
            session_id = %session_id,
            "session removed from wishlist"
        );
        Ok(true)
    }

    /// List the sessions on a profile's wishlist.
    pub async fn list(&self, profile_id: Uuid) -> AppResult<Vec<Session>> {
        Ok(Session::list_wishlist(&self.pool, profile_id).await?)
    }
}

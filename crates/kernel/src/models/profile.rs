//! Attendee profile model.
//!
//! One profile per end user, identified by email. Profiles are created
//! lazily on the first authenticated request, mirroring the behavior of
//! the legacy backend.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Tee-shirt size recorded when the user has not picked one.
const TEE_SHIRT_NOT_SPECIFIED: &str = "NOT_SPECIFIED";

/// Attendee profile record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Display name shown on conference listings.
    pub display_name: String,

    /// Email identity (unique).
    pub main_email: String,

    /// Tee-shirt size token.
    pub tee_shirt_size: String,
}

/// Input for updating the user-modifiable profile fields.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfile {
    pub display_name: Option<String>,
    pub tee_shirt_size: Option<String>,
}

impl Profile {
    /// Find a profile by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, display_name, main_email, tee_shirt_size FROM profile WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch profile by id")?;

        Ok(profile)
    }

    /// Find a profile by email.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, display_name, main_email, tee_shirt_size FROM profile WHERE main_email = $1",
        )
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("failed to fetch profile by email")?;

        Ok(profile)
    }

    /// Fetch the profile for an email, creating it if absent.
    ///
    /// The initial display name is the local part of the email. The insert
    /// uses ON CONFLICT DO NOTHING so two concurrent first requests for the
    /// same user converge on one row.
    pub async fn ensure(pool: &PgPool, email: &str) -> Result<Self> {
        if let Some(profile) = Self::find_by_email(pool, email).await? {
            return Ok(profile);
        }

        let display_name = email.split('@').next().unwrap_or(email).to_string();

        sqlx::query(
            r#"
            INSERT INTO profile (id, display_name, main_email, tee_shirt_size)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (main_email) DO NOTHING
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&display_name)
        .bind(email)
        .bind(TEE_SHIRT_NOT_SPECIFIED)
        .execute(pool)
        .await
        .context("failed to create profile")?;

        Self::find_by_email(pool, email)
            .await?
            .context("profile missing after insert")
    }

    /// Update user-modifiable fields, returning the stored profile.
    pub async fn update(pool: &PgPool, id: Uuid, input: UpdateProfile) -> Result<Self> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profile
            SET display_name = COALESCE($2, display_name),
                tee_shirt_size = COALESCE($3, tee_shirt_size)
            WHERE id = $1
            RETURNING id, display_name, main_email, tee_shirt_size
            "#,
        )
        .bind(id)
        .bind(input.display_name)
        .bind(input.tee_shirt_size)
        .fetch_one(pool)
        .await
        .context("failed to update profile")?;

        Ok(profile)
    }

    /// Resolve display names for a set of profile ids in one query.
    pub async fn display_names(pool: &PgPool, ids: &[Uuid]) -> Result<HashMap<Uuid, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, String)> = sqlx::query_as(
            "SELECT id, display_name FROM profile WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(pool)
        .await
        .context("failed to fetch display names")?;

        Ok(rows.into_iter().collect())
    }
}

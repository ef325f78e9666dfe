//! Speaker model.
//!
//! Speakers are owned by the profile that created them and may be
//! referenced by sessions across multiple conferences.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Speaker record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Speaker {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Owning profile.
    pub owner_id: Uuid,

    pub first_name: String,
    pub last_name: String,
}

/// Input for creating a speaker.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSpeaker {
    pub first_name: String,
    pub last_name: String,
}

impl Speaker {
    /// Create a new speaker.
    pub async fn create(pool: &PgPool, owner_id: Uuid, input: CreateSpeaker) -> Result<Self> {
        let speaker = sqlx::query_as::<_, Speaker>(
            r#"
            INSERT INTO speaker (id, owner_id, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, owner_id, first_name, last_name
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(owner_id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .fetch_one(pool)
        .await
        .context("failed to create speaker")?;

        Ok(speaker)
    }

    /// Find a speaker by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let speaker = sqlx::query_as::<_, Speaker>(
            "SELECT id, owner_id, first_name, last_name FROM speaker WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch speaker by id")?;

        Ok(speaker)
    }

    /// List speakers created by a profile.
    pub async fn list_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Self>> {
        let speakers = sqlx::query_as::<_, Speaker>(
            "SELECT id, owner_id, first_name, last_name FROM speaker \
             WHERE owner_id = $1 ORDER BY last_name, first_name",
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
        .context("failed to list speakers by owner")?;

        Ok(speakers)
    }
}

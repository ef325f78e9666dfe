//! Session model and queries.
//!
//! Sessions are owned exclusively by their conference and reference a
//! speaker that may appear across conferences.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Column list shared by the queries below.
const COLUMNS: &str = "id, conference_id, speaker_id, name, highlights, \
                       type_of_session, duration, date, start_time";

/// Session record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Owning conference.
    pub conference_id: Uuid,

    /// Speaker presenting this session.
    pub speaker_id: Uuid,

    /// Session name.
    pub name: String,

    /// Free-text highlights.
    pub highlights: Option<String>,

    /// Session type (workshop, lecture, keynote, ...).
    pub type_of_session: Option<String>,

    /// Duration in minutes.
    pub duration: Option<i32>,

    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
}

/// Input for creating a session.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSession {
    pub conference_id: Uuid,
    pub speaker_id: Uuid,
    pub name: String,
    pub highlights: Option<String>,
    pub type_of_session: Option<String>,
    pub duration: Option<i32>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
}

impl Session {
    /// Create a new session.
    pub async fn create(pool: &PgPool, input: CreateSession) -> Result<Self> {
        let session = sqlx::query_as::<_, Session>(&format!(
            r#"
            INSERT INTO session
                (id, conference_id, speaker_id, name, highlights,
                 type_of_session, duration, date, start_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(input.conference_id)
        .bind(input.speaker_id)
        .bind(&input.name)
        .bind(&input.highlights)
        .bind(&input.type_of_session)
        .bind(input.duration)
        .bind(input.date)
        .bind(input.start_time)
        .fetch_one(pool)
        .await
        .context("failed to create session")?;

        Ok(session)
    }

    /// Check that a session exists.
    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM session WHERE id = $1)")
                .bind(id)
                .fetch_one(pool)
                .await
                .context("failed to check session existence")?;

        Ok(row.0)
    }

    /// List all sessions of a conference.
    pub async fn list_by_conference(pool: &PgPool, conference_id: Uuid) -> Result<Vec<Self>> {
        let sessions = sqlx::query_as::<_, Session>(&format!(
            "SELECT {COLUMNS} FROM session WHERE conference_id = $1 ORDER BY date, start_time"
        ))
        .bind(conference_id)
        .fetch_all(pool)
        .await
        .context("failed to list sessions by conference")?;

        Ok(sessions)
    }

    /// List sessions of a conference filtered by type.
    pub async fn list_by_conference_and_type(
        pool: &PgPool,
        conference_id: Uuid,
        type_of_session: &str,
    ) -> Result<Vec<Self>> {
        let sessions = sqlx::query_as::<_, Session>(&format!(
            "SELECT {COLUMNS} FROM session \
             WHERE conference_id = $1 AND type_of_session = $2 ORDER BY date, start_time"
        ))
        .bind(conference_id)
        .bind(type_of_session)
        .fetch_all(pool)
        .await
        .context("failed to list sessions by type")?;

        Ok(sessions)
    }

    /// List sessions across all conferences for speakers matching a name.
    pub async fn list_by_speaker_name(
        pool: &PgPool,
        last_name: &str,
        first_name: Option<&str>,
    ) -> Result<Vec<Self>> {
        let columns = COLUMNS.replace(", ", ", s.");
        let sessions = match first_name {
            Some(first) => {
                sqlx::query_as::<_, Session>(&format!(
                    r#"
                    SELECT s.{columns}
                    FROM session s
                    INNER JOIN speaker sp ON sp.id = s.speaker_id
                    WHERE sp.last_name = $1 AND sp.first_name = $2
                    ORDER BY s.date, s.start_time
                    "#
                ))
                .bind(last_name)
                .bind(first)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Session>(&format!(
                    r#"
                    SELECT s.{columns}
                    FROM session s
                    INNER JOIN speaker sp ON sp.id = s.speaker_id
                    WHERE sp.last_name = $1
                    ORDER BY s.date, s.start_time
                    "#
                ))
                .bind(last_name)
                .fetch_all(pool)
                .await
            }
        }
        .context("failed to list sessions by speaker name")?;

        Ok(sessions)
    }

    /// List sessions on a date whose start time falls within a range
    /// (inclusive on both ends).
    pub async fn list_by_date_and_start_time_range(
        pool: &PgPool,
        date: NaiveDate,
        earliest: NaiveTime,
        latest: NaiveTime,
    ) -> Result<Vec<Self>> {
        let sessions = sqlx::query_as::<_, Session>(&format!(
            "SELECT {COLUMNS} FROM session \
             WHERE date = $1 AND start_time >= $2 AND start_time <= $3 \
             ORDER BY start_time, name"
        ))
        .bind(date)
        .bind(earliest)
        .bind(latest)
        .fetch_all(pool)
        .await
        .context("failed to list sessions by date and time range")?;

        Ok(sessions)
    }

    /// List a named speaker's sessions on a specific date, across
    /// conferences.
    pub async fn list_by_speaker_name_on_date(
        pool: &PgPool,
        last_name: &str,
        first_name: Option<&str>,
        date: NaiveDate,
    ) -> Result<Vec<Self>> {
        let columns = COLUMNS.replace(", ", ", s.");
        let sessions = match first_name {
            Some(first) => {
                sqlx::query_as::<_, Session>(&format!(
                    r#"
                    SELECT s.{columns}
                    FROM session s
                    INNER JOIN speaker sp ON sp.id = s.speaker_id
                    WHERE sp.last_name = $1 AND sp.first_name = $2 AND s.date = $3
                    ORDER BY s.start_time
                    "#
                ))
                .bind(last_name)
                .bind(first)
                .bind(date)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Session>(&format!(
                    r#"
                    SELECT s.{columns}
                    FROM session s
                    INNER JOIN speaker sp ON sp.id = s.speaker_id
                    WHERE sp.last_name = $1 AND s.date = $2
                    ORDER BY s.start_time
                    "#
                ))
                .bind(last_name)
                .bind(date)
                .fetch_all(pool)
                .await
            }
        }
        .context("failed to list sessions by speaker on date")?;

        Ok(sessions)
    }

    /// List sessions that are not of the given type and start before a
    /// cutoff time.
    ///
    /// Sessions without a type or start time are excluded, matching the
    /// comparison semantics callers expect from both predicates.
    pub async fn list_not_of_type_before(
        pool: &PgPool,
        excluded_type: &str,
        cutoff: NaiveTime,
    ) -> Result<Vec<Self>> {
        let sessions = sqlx::query_as::<_, Session>(&format!(
            "SELECT {COLUMNS} FROM session \
             WHERE type_of_session <> $1 AND start_time < $2 \
             ORDER BY start_time, name"
        ))
        .bind(excluded_type)
        .bind(cutoff)
        .fetch_all(pool)
        .await
        .context("failed to list sessions by type exclusion and time")?;

        Ok(sessions)
    }

    /// Count a speaker's sessions within one conference.
    pub async fn count_for_speaker(
        pool: &PgPool,
        conference_id: Uuid,
        speaker_id: Uuid,
    ) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM session WHERE conference_id = $1 AND speaker_id = $2",
        )
        .bind(conference_id)
        .bind(speaker_id)
        .fetch_one(pool)
        .await
        .context("failed to count speaker sessions")?;

        Ok(row.0)
    }

    /// List the sessions on a profile's wishlist.
    pub async fn list_wishlist(pool: &PgPool, profile_id: Uuid) -> Result<Vec<Self>> {
        let columns = COLUMNS.replace(", ", ", s.");
        let sessions = sqlx::query_as::<_, Session>(&format!(
            r#"
            SELECT s.{columns}
            FROM session s
            INNER JOIN wishlist w ON w.session_id = s.id
            WHERE w.profile_id = $1
            ORDER BY s.date, s.start_time
            "#
        ))
        .bind(profile_id)
        .fetch_all(pool)
        .await
        .context("failed to list wishlist sessions")?;

        Ok(sessions)
    }
}

//! Database connection pool management and schema bootstrap.

use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::Config;

/// Create a PostgreSQL connection pool.
pub async fn create_pool(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to PostgreSQL")?;

    Ok(pool)
}

/// Check if the database connection is healthy.
pub async fn check_health(pool: &PgPool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}

/// Idempotent DDL executed at startup.
///
/// The legacy ancestor-key hierarchy is rendered as explicit foreign keys;
/// the profile's attendance and wishlist sets are join tables whose composite
/// primary keys enforce set semantics.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS profile (
        id UUID PRIMARY KEY,
        display_name TEXT NOT NULL,
        main_email TEXT NOT NULL UNIQUE,
        tee_shirt_size TEXT NOT NULL DEFAULT 'NOT_SPECIFIED'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS conference (
        id UUID PRIMARY KEY,
        organizer_id UUID NOT NULL REFERENCES profile(id),
        name TEXT NOT NULL,
        description TEXT,
        city TEXT NOT NULL,
        topics TEXT[] NOT NULL DEFAULT '{}',
        month INT NOT NULL DEFAULT 0,
        max_attendees INT NOT NULL DEFAULT 0,
        seats_available INT NOT NULL DEFAULT 0,
        start_date DATE,
        end_date DATE,
        CONSTRAINT seats_within_capacity
            CHECK (seats_available >= 0 AND seats_available <= max_attendees)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS speaker (
        id UUID PRIMARY KEY,
        owner_id UUID NOT NULL REFERENCES profile(id),
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS session (
        id UUID PRIMARY KEY,
        conference_id UUID NOT NULL REFERENCES conference(id),
        speaker_id UUID NOT NULL REFERENCES speaker(id),
        name TEXT NOT NULL,
        highlights TEXT,
        type_of_session TEXT,
        duration INT,
        date DATE,
        start_time TIME
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attendance (
        profile_id UUID NOT NULL REFERENCES profile(id),
        conference_id UUID NOT NULL REFERENCES conference(id),
        PRIMARY KEY (profile_id, conference_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS wishlist (
        profile_id UUID NOT NULL REFERENCES profile(id),
        session_id UUID NOT NULL REFERENCES session(id),
        PRIMARY KEY (profile_id, session_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS conference_organizer_idx ON conference (organizer_id)",
    "CREATE INDEX IF NOT EXISTS conference_seats_idx ON conference (seats_available)",
    "CREATE INDEX IF NOT EXISTS session_conference_idx ON session (conference_id)",
    "CREATE INDEX IF NOT EXISTS session_speaker_idx ON session (speaker_id)",
    "CREATE INDEX IF NOT EXISTS speaker_owner_idx ON speaker (owner_id)",
];

/// Create tables and indexes if they do not already exist.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("failed to apply schema statement")?;
    }

    Ok(())
}

/// Whether an error is a Postgres write conflict worth retrying.
///
/// 40001 = serialization_failure, 40P01 = deadlock_detected.
pub fn is_serialization_conflict(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        matches!(db_err.code().as_deref(), Some("40001") | Some("40P01"))
    } else {
        false
    }
}

//! Conference model and queries.
//!
//! `seats_available` is mutated only by the reservation manager; everything
//! else is ordinary record state. `max_attendees` is fixed at creation.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Column list shared by the fixed-shape queries below.
const COLUMNS: &str = "id, organizer_id, name, description, city, topics, month, \
                       max_attendees, seats_available, start_date, end_date";

/// Conference record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conference {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Owning organizer profile.
    pub organizer_id: Uuid,

    /// Display name.
    pub name: String,

    /// Free-text description.
    pub description: Option<String>,

    /// Host city.
    pub city: String,

    /// Topic labels.
    pub topics: Vec<String>,

    /// Month of the start date (1-12, 0 when no start date).
    pub month: i32,

    /// Seat capacity, fixed at creation.
    pub max_attendees: i32,

    /// Remaining seats; only the reservation manager writes this.
    pub seats_available: i32,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Input for creating a conference.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateConference {
    pub name: String,
    pub description: Option<String>,
    pub city: Option<String>,
    pub topics: Option<Vec<String>>,
    pub max_attendees: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Input for updating a conference. Only provided fields are copied;
/// capacity and seat count are never updated through this path.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateConference {
    pub name: Option<String>,
    pub description: Option<String>,
    pub city: Option<String>,
    pub topics: Option<Vec<String>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Conference {
    /// Create a new conference with legacy field defaults.
    ///
    /// `month` derives from the start date, and the seat ledger opens at
    /// full capacity.
    pub async fn create(pool: &PgPool, organizer_id: Uuid, input: CreateConference) -> Result<Self> {
        let city = input
            .city
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "Default City".to_string());
        let topics = input
            .topics
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| vec!["Default".to_string(), "Topic".to_string()]);
        let max_attendees = input.max_attendees.unwrap_or(0).max(0);
        let month = input
            .start_date
            .map(|d| d.month() as i32)
            .unwrap_or(0);

        let conference = sqlx::query_as::<_, Conference>(&format!(
            r#"
            INSERT INTO conference
                (id, organizer_id, name, description, city, topics, month,
                 max_attendees, seats_available, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8, $9, $10)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(organizer_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&city)
        .bind(&topics)
        .bind(month)
        .bind(max_attendees)
        .bind(input.start_date)
        .bind(input.end_date)
        .fetch_one(pool)
        .await
        .context("failed to create conference")?;

        Ok(conference)
    }

    /// Find a conference by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let conference = sqlx::query_as::<_, Conference>(&format!(
            "SELECT {COLUMNS} FROM conference WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch conference by id")?;

        Ok(conference)
    }

    /// Copy provided fields onto an existing conference.
    ///
    /// Runs in a transaction with a row lock so a concurrent edit cannot be
    /// silently lost. `month` is re-derived when the start date changes.
    pub async fn update(pool: &PgPool, id: Uuid, input: UpdateConference) -> Result<Option<Self>> {
        let mut tx = pool.begin().await.context("failed to start transaction")?;

        let existing = sqlx::query_as::<_, Conference>(&format!(
            "SELECT {COLUMNS} FROM conference WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("failed to lock conference for update")?;

        let Some(mut conference) = existing else {
            return Ok(None);
        };

        if let Some(name) = input.name {
            conference.name = name;
        }
        if let Some(description) = input.description {
            conference.description = Some(description);
        }
        if let Some(city) = input.city {
            conference.city = city;
        }
        if let Some(topics) = input.topics {
            conference.topics = topics;
        }
        if let Some(start_date) = input.start_date {
            conference.start_date = Some(start_date);
            conference.month = start_date.month() as i32;
        }
        if let Some(end_date) = input.end_date {
            conference.end_date = Some(end_date);
        }

        sqlx::query(
            r#"
            UPDATE conference
            SET name = $2, description = $3, city = $4, topics = $5,
                month = $6, start_date = $7, end_date = $8
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&conference.name)
        .bind(&conference.description)
        .bind(&conference.city)
        .bind(&conference.topics)
        .bind(conference.month)
        .bind(conference.start_date)
        .bind(conference.end_date)
        .execute(&mut *tx)
        .await
        .context("failed to update conference")?;

        tx.commit().await.context("failed to commit update")?;

        Ok(Some(conference))
    }

    /// List conferences created by an organizer.
    pub async fn list_by_organizer(pool: &PgPool, organizer_id: Uuid) -> Result<Vec<Self>> {
        let conferences = sqlx::query_as::<_, Conference>(&format!(
            "SELECT {COLUMNS} FROM conference WHERE organizer_id = $1 ORDER BY name"
        ))
        .bind(organizer_id)
        .fetch_all(pool)
        .await
        .context("failed to list conferences by organizer")?;

        Ok(conferences)
    }

    /// List conferences a profile is registered to attend.
    pub async fn list_attending(pool: &PgPool, profile_id: Uuid) -> Result<Vec<Self>> {
        let conferences = sqlx::query_as::<_, Conference>(&format!(
            r#"
            SELECT c.{columns}
            FROM conference c
            INNER JOIN attendance a ON a.conference_id = c.id
            WHERE a.profile_id = $1
            ORDER BY c.name
            "#,
            columns = COLUMNS.replace(", ", ", c."),
        ))
        .bind(profile_id)
        .fetch_all(pool)
        .await
        .context("failed to list attended conferences")?;

        Ok(conferences)
    }

    /// Execute a compiled query plan's SQL verbatim.
    pub async fn search(pool: &PgPool, sql: &str) -> Result<Vec<Self>> {
        let conferences = sqlx::query_as::<_, Conference>(sql)
            .fetch_all(pool)
            .await
            .context("failed to execute conference query plan")?;

        Ok(conferences)
    }

    /// Names of conferences that are nearly sold out (1-5 seats left).
    pub async fn nearly_sold_out_names(pool: &PgPool) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM conference \
             WHERE seats_available > 0 AND seats_available <= 5 ORDER BY name",
        )
        .fetch_all(pool)
        .await
        .context("failed to list nearly sold out conferences")?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}

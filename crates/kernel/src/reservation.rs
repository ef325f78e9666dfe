//! Capacity reservation engine.
//!
//! Registration touches exactly two aggregates — the caller's profile
//! membership set and the conference's seat ledger — and must commit both
//! or neither. The transaction serializes at the conference aggregate via a
//! row lock, with a bounded retry on detected write conflicts.

use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::is_serialization_conflict;
use crate::error::{AppError, AppResult};

/// Maximum transaction attempts before surfacing a transient failure.
const MAX_TX_ATTEMPTS: u32 = 3;

/// Seat ledger violations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CapacityError {
    #[error("no seats available")]
    SoldOut,

    #[error("seat count already at capacity")]
    AtCapacity,
}

/// The conference's seat-count invariant holder.
///
/// Maintains `0 <= seats_available <= max_attendees`. All seat mutations go
/// through [`reserve`](Self::reserve) and [`release`](Self::release).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityLedger {
    seats_available: i32,
    max_attendees: i32,
}

impl CapacityLedger {
    /// Ledger over the stored seat counts.
    pub fn new(seats_available: i32, max_attendees: i32) -> Self {
        Self {
            seats_available,
            max_attendees,
        }
    }

    /// Ledger for a newly created conference (all seats open).
    pub fn at_capacity(max_attendees: i32) -> Self {
        Self::new(max_attendees, max_attendees)
    }

    /// Remaining seats.
    pub fn seats_available(&self) -> i32 {
        self.seats_available
    }

    /// Take one seat.
    pub fn reserve(&mut self) -> Result<(), CapacityError> {
        if self.seats_available <= 0 {
            return Err(CapacityError::SoldOut);
        }
        self.seats_available -= 1;
        Ok(())
    }

    /// Return one seat.
    pub fn release(&mut self) -> Result<(), CapacityError> {
        if self.seats_available >= self.max_attendees {
            return Err(CapacityError::AtCapacity);
        }
        self.seats_available += 1;
        Ok(())
    }
}

/// Orchestrates atomic registration across a profile and a conference.
#[derive(Debug, Clone)]
pub struct ReservationManager {
    pool: PgPool,
}

impl ReservationManager {
    /// Create a new reservation manager.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a profile for a conference.
    ///
    /// Fails `NotFound` when the conference does not exist, `Conflict` when
    /// the profile is already registered or no seats remain.
    pub async fn register(&self, profile_id: Uuid, conference_id: Uuid) -> AppResult<()> {
        for attempt in 1..=MAX_TX_ATTEMPTS {
            match self.try_register(profile_id, conference_id).await {
                Err(AppError::Database(e)) if is_serialization_conflict(&e) => {
                    warn!(
                        attempt,
                        conference_id = %conference_id,
                        "registration hit a write conflict, retrying"
                    );
                }
                other => return other,
            }
        }

        Err(AppError::Transient)
    }

    /// Remove a registration.
    ///
    /// Returns `false` when the pair was never registered (idempotent no-op,
    /// nothing is mutated), `true` when a registration was reversed.
    pub async fn unregister(&self, profile_id: Uuid, conference_id: Uuid) -> AppResult<bool> {
        for attempt in 1..=MAX_TX_ATTEMPTS {
            match self.try_unregister(profile_id, conference_id).await {
                Err(AppError::Database(e)) if is_serialization_conflict(&e) => {
                    warn!(
                        attempt,
                        conference_id = %conference_id,
                        "unregistration hit a write conflict, retrying"
                    );
                }
                other => return other,
            }
        }

        Err(AppError::Transient)
    }

    async fn try_register(&self, profile_id: Uuid, conference_id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent registrations per conference.
        let row: Option<(i32, i32)> = sqlx::query_as(
            "SELECT seats_available, max_attendees FROM conference WHERE id = $1 FOR UPDATE",
        )
        .bind(conference_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((seats_available, max_attendees)) = row else {
            return Err(AppError::NotFound("conference"));
        };

        let (registered,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM attendance \
             WHERE profile_id = $1 AND conference_id = $2)",
        )
        .bind(profile_id)
        .bind(conference_id)
        .fetch_one(&mut *tx)
        .await?;

        if registered {
            return Err(AppError::Conflict(
                "already registered for this conference".to_string(),
            ));
        }

        let mut ledger = CapacityLedger::new(seats_available, max_attendees);
        ledger
            .reserve()
            .map_err(|_| AppError::Conflict("no seats available".to_string()))?;

        sqlx::query("INSERT INTO attendance (profile_id, conference_id) VALUES ($1, $2)")
            .bind(profile_id)
            .bind(conference_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE conference SET seats_available = $2 WHERE id = $1")
            .bind(conference_id)
            .bind(ledger.seats_available())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            profile_id = %profile_id,
            conference_id = %conference_id,
            seats_available = ledger.seats_available(),
            "registered for conference"
        );
        Ok(())
    }

    async fn try_unregister(&self, profile_id: Uuid, conference_id: Uuid) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(i32, i32)> = sqlx::query_as(
            "SELECT seats_available, max_attendees FROM conference WHERE id = $1 FOR UPDATE",
        )
        .bind(conference_id)
        .fetch_optional(&mut *tx)
        .await?;

        // Unregistering from a vanished conference is a no-op, not an error.
        let Some((seats_available, max_attendees)) = row else {
            return Ok(false);
        };

        let deleted = sqlx::query(
            "DELETE FROM attendance WHERE profile_id = $1 AND conference_id = $2",
        )
        .bind(profile_id)
        .bind(conference_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if deleted == 0 {
            return Ok(false);
        }

        let mut ledger = CapacityLedger::new(seats_available, max_attendees);
        ledger.release().map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "seat ledger out of sync for conference {conference_id}: {e}"
            ))
        })?;

        sqlx::query("UPDATE conference SET seats_available = $2 WHERE id = $1")
            .bind(conference_id)
            .bind(ledger.seats_available())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            profile_id = %profile_id,
            conference_id = %conference_id,
            seats_available = ledger.seats_available(),
            "unregistered from conference"
        );
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn reserve_decrements_until_sold_out() {
        let mut ledger = CapacityLedger::at_capacity(10);

        for expected in (0..10).rev() {
            ledger.reserve().unwrap();
            assert_eq!(ledger.seats_available(), expected);
        }

        // Eleventh registration has no seat.
        assert_eq!(ledger.reserve(), Err(CapacityError::SoldOut));
        assert_eq!(ledger.seats_available(), 0);
    }

    #[test]
    fn release_restores_seats_up_to_capacity() {
        let mut ledger = CapacityLedger::new(0, 2);

        ledger.release().unwrap();
        ledger.release().unwrap();
        assert_eq!(ledger.seats_available(), 2);

        // Releasing past capacity would break the invariant.
        assert_eq!(ledger.release(), Err(CapacityError::AtCapacity));
        assert_eq!(ledger.seats_available(), 2);
    }

    #[test]
    fn zero_capacity_conference_never_admits() {
        let mut ledger = CapacityLedger::at_capacity(0);
        assert_eq!(ledger.reserve(), Err(CapacityError::SoldOut));
    }

    #[test]
    fn reserve_then_release_round_trips() {
        let mut ledger = CapacityLedger::at_capacity(5);

        ledger.reserve().unwrap();
        ledger.reserve().unwrap();
        assert_eq!(ledger.seats_available(), 3);

        ledger.release().unwrap();
        assert_eq!(ledger.seats_available(), 4);
    }

    #[test]
    fn seats_equal_capacity_minus_registered() {
        let max = 7;
        let mut ledger = CapacityLedger::at_capacity(max);
        let mut registered = 0;

        for _ in 0..4 {
            ledger.reserve().unwrap();
            registered += 1;
            assert_eq!(ledger.seats_available(), max - registered);
        }

        ledger.release().unwrap();
        registered -= 1;
        assert_eq!(ledger.seats_available(), max - registered);
    }

    #[test]
    fn failed_reserve_leaves_ledger_unchanged() {
        let mut ledger = CapacityLedger::new(0, 3);
        let before = ledger;

        assert!(ledger.reserve().is_err());
        assert_eq!(ledger, before);
    }
}

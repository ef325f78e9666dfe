//! Session and wishlist route handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Conference, CreateSession, Session, Speaker};
use crate::state::AppState;

use super::helpers::CurrentUser;

/// Session type excluded by the evening session search.
const WORKSHOP_TYPE: &str = "Workshop";

/// Evening cutoff for the non-workshop session search.
const EVENING_CUTOFF: &str = "19:00";

/// Query parameters for the speaker session search.
#[derive(Debug, Deserialize)]
pub struct BySpeakerQuery {
    pub last_name: String,
    pub first_name: Option<String>,
}

/// Query parameters for the date and start-time-range search.
#[derive(Debug, Deserialize)]
pub struct ByDateQuery {
    pub date: NaiveDate,
    pub earliest: String,
    pub latest: String,
}

/// Query parameters for the speaker-on-date search.
#[derive(Debug, Deserialize)]
pub struct BySpeakerOnDateQuery {
    pub last_name: String,
    pub first_name: Option<String>,
    pub date: NaiveDate,
}

/// Response for wishlist additions.
#[derive(Debug, Serialize)]
pub struct WishlistAddResponse {
    pub accepted: bool,
}

/// Response for wishlist removals.
#[derive(Debug, Serialize)]
pub struct WishlistResponse {
    pub changed: bool,
}

/// Parse an `HH:MM` clock time, accepting optional seconds.
fn parse_clock_time(value: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| AppError::BadRequest(format!("invalid time {value:?}, expected HH:MM")))
}

/// Create the session router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/session", post(create_session))
        .route("/api/conference/{id}/sessions", get(conference_sessions))
        .route(
            "/api/conference/{id}/sessions/{type}",
            get(conference_sessions_by_type),
        )
        .route("/api/sessions/by-speaker", get(sessions_by_speaker))
        .route("/api/sessions/by-date", get(sessions_by_date))
        .route(
            "/api/sessions/by-speaker-on-date",
            get(sessions_by_speaker_on_date),
        )
        .route(
            "/api/sessions/non-workshop-before-7pm",
            get(non_workshop_sessions_before_evening),
        )
        .route(
            "/api/wishlist/{session_id}",
            post(wishlist_add).delete(wishlist_remove),
        )
        .route("/api/wishlist", get(wishlist_list))
}

async fn create_session(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
    Json(input): Json<CreateSession>,
) -> AppResult<(StatusCode, Json<Session>)> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("session name is required".to_string()));
    }

    let conference = Conference::find_by_id(state.db(), input.conference_id)
        .await?
        .ok_or(AppError::NotFound("conference"))?;

    if conference.organizer_id != profile.id {
        return Err(AppError::Forbidden(
            "only the organizer can add sessions to this conference".to_string(),
        ));
    }

    let speaker = Speaker::find_by_id(state.db(), input.speaker_id)
        .await?
        .ok_or(AppError::NotFound("speaker"))?;

    if speaker.owner_id != profile.id {
        return Err(AppError::Forbidden(
            "speaker belongs to another profile".to_string(),
        ));
    }

    let session = Session::create(state.db(), input).await?;

    // Featured-speaker recomputation runs off the request path; a failure
    // leaves the previous cached value in place.
    let derived = state.derived().clone();
    let (conference_id, speaker_id) = (session.conference_id, session.speaker_id);
    tokio::spawn(async move {
        if let Err(e) = derived
            .recompute_featured_speaker(conference_id, speaker_id)
            .await
        {
            error!(
                error = %e,
                conference_id = %conference_id,
                speaker_id = %speaker_id,
                "featured speaker recomputation failed"
            );
        }
    });

    Ok((StatusCode::CREATED, Json(session)))
}

async fn conference_sessions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Session>>> {
    if Conference::find_by_id(state.db(), id).await?.is_none() {
        return Err(AppError::NotFound("conference"));
    }

    Ok(Json(Session::list_by_conference(state.db(), id).await?))
}

async fn conference_sessions_by_type(
    State(state): State<AppState>,
    Path((id, type_of_session)): Path<(Uuid, String)>,
) -> AppResult<Json<Vec<Session>>> {
    if Conference::find_by_id(state.db(), id).await?.is_none() {
        return Err(AppError::NotFound("conference"));
    }

    Ok(Json(
        Session::list_by_conference_and_type(state.db(), id, &type_of_session).await?,
    ))
}

async fn sessions_by_speaker(
    State(state): State<AppState>,
    Query(query): Query<BySpeakerQuery>,
) -> AppResult<Json<Vec<Session>>> {
    if query.last_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "speaker last name is required".to_string(),
        ));
    }

    Ok(Json(
        Session::list_by_speaker_name(
            state.db(),
            query.last_name.trim(),
            query
                .first_name
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty()),
        )
        .await?,
    ))
}

async fn sessions_by_date(
    State(state): State<AppState>,
    Query(query): Query<ByDateQuery>,
) -> AppResult<Json<Vec<Session>>> {
    let earliest = parse_clock_time(&query.earliest)?;
    let latest = parse_clock_time(&query.latest)?;

    Ok(Json(
        Session::list_by_date_and_start_time_range(state.db(), query.date, earliest, latest)
            .await?,
    ))
}

async fn sessions_by_speaker_on_date(
    State(state): State<AppState>,
    Query(query): Query<BySpeakerOnDateQuery>,
) -> AppResult<Json<Vec<Session>>> {
    if query.last_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "speaker last name is required".to_string(),
        ));
    }

    Ok(Json(
        Session::list_by_speaker_name_on_date(
            state.db(),
            query.last_name.trim(),
            query
                .first_name
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty()),
            query.date,
        )
        .await?,
    ))
}

async fn non_workshop_sessions_before_evening(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Session>>> {
    let cutoff = parse_clock_time(EVENING_CUTOFF)?;

    Ok(Json(
        Session::list_not_of_type_before(state.db(), WORKSHOP_TYPE, cutoff).await?,
    ))
}

async fn wishlist_add(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
    Path(session_id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<WishlistAddResponse>)> {
    state.wishlists().add(profile.id, session_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(WishlistAddResponse { accepted: true }),
    ))
}

async fn wishlist_remove(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<WishlistResponse>> {
    let changed = state.wishlists().remove(profile.id, session_id).await?;

    Ok(Json(WishlistResponse { changed }))
}

async fn wishlist_list(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
) -> AppResult<Json<Vec<Session>>> {
    Ok(Json(state.wishlists().list(profile.id).await?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn clock_time_parses_with_and_without_seconds() {
        assert_eq!(
            parse_clock_time("19:00").unwrap(),
            NaiveTime::from_hms_opt(19, 0, 0).unwrap()
        );
        assert_eq!(
            parse_clock_time("09:30:15").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 15).unwrap()
        );
    }

    #[test]
    fn malformed_clock_time_rejected() {
        for bad in ["7pm", "25:00", "19", ""] {
            let err = parse_clock_time(bad).unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "{bad:?}");
        }
    }

    #[test]
    fn evening_cutoff_is_valid() {
        assert_eq!(
            parse_clock_time(EVENING_CUTOFF).unwrap(),
            NaiveTime::from_hms_opt(19, 0, 0).unwrap()
        );
    }

    #[test]
    fn wishlist_add_reports_accepted() {
        let body = serde_json::to_value(WishlistAddResponse { accepted: true }).unwrap();
        assert_eq!(body, serde_json::json!({ "accepted": true }));
    }

    #[test]
    fn wishlist_remove_reports_changed() {
        let body = serde_json::to_value(WishlistResponse { changed: false }).unwrap();
        assert_eq!(body, serde_json::json!({ "changed": false }));
    }
}

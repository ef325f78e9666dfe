//! Conference route handlers.
//!
//! Creation, update, queries, and registration. Responses embed the
//! organizer's display name so callers never resolve profiles themselves.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Conference, CreateConference, Profile, UpdateConference};
use crate::query::{QueryPlanner, RawFilter};
use crate::state::AppState;

use super::helpers::CurrentUser;

/// Conference with its organizer's display name.
#[derive(Debug, Serialize)]
pub struct ConferenceResponse {
    #[serde(flatten)]
    pub conference: Conference,
    pub organizer_display_name: String,
}

/// Request body for `POST /api/conferences/query`.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub filters: Vec<RawFilter>,
}

/// Response for registration mutations.
#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub accepted: bool,
}

/// Response for unregistration mutations.
#[derive(Debug, Serialize)]
pub struct UnregistrationResponse {
    pub changed: bool,
}

/// Create the conference router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/conference", post(create_conference))
        .route("/api/conference/{id}", get(get_conference))
        .route("/api/conference/{id}", put(update_conference))
        .route("/api/conferences/created", get(conferences_created))
        .route("/api/conferences/query", post(query_conferences))
        .route("/api/conferences/attending", get(conferences_attending))
        .route(
            "/api/conference/{id}/registration",
            post(register).delete(unregister),
        )
}

/// Attach organizer display names to a batch of conferences.
async fn with_organizer_names(
    state: &AppState,
    conferences: Vec<Conference>,
) -> AppResult<Vec<ConferenceResponse>> {
    let organizer_ids: Vec<Uuid> = conferences.iter().map(|c| c.organizer_id).collect();
    let names: HashMap<Uuid, String> = Profile::display_names(state.db(), &organizer_ids).await?;

    Ok(conferences
        .into_iter()
        .map(|conference| {
            let organizer_display_name =
                names.get(&conference.organizer_id).cloned().unwrap_or_default();
            ConferenceResponse {
                conference,
                organizer_display_name,
            }
        })
        .collect())
}

async fn create_conference(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
    Json(input): Json<CreateConference>,
) -> AppResult<(StatusCode, Json<ConferenceResponse>)> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "conference name is required".to_string(),
        ));
    }

    let conference = Conference::create(state.db(), profile.id, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(ConferenceResponse {
            conference,
            organizer_display_name: profile.display_name,
        }),
    ))
}

async fn get_conference(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ConferenceResponse>> {
    let conference = Conference::find_by_id(state.db(), id)
        .await?
        .ok_or(AppError::NotFound("conference"))?;

    let mut responses = with_organizer_names(&state, vec![conference]).await?;
    let response = responses.pop().ok_or(AppError::NotFound("conference"))?;

    Ok(Json(response))
}

async fn update_conference(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateConference>,
) -> AppResult<Json<ConferenceResponse>> {
    let existing = Conference::find_by_id(state.db(), id)
        .await?
        .ok_or(AppError::NotFound("conference"))?;

    if existing.organizer_id != profile.id {
        return Err(AppError::Forbidden(
            "only the organizer can update this conference".to_string(),
        ));
    }

    let conference = Conference::update(state.db(), id, input)
        .await?
        .ok_or(AppError::NotFound("conference"))?;

    Ok(Json(ConferenceResponse {
        conference,
        organizer_display_name: profile.display_name,
    }))
}

async fn conferences_created(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
) -> AppResult<Json<Vec<ConferenceResponse>>> {
    let conferences = Conference::list_by_organizer(state.db(), profile.id).await?;

    Ok(Json(
        conferences
            .into_iter()
            .map(|conference| ConferenceResponse {
                conference,
                organizer_display_name: profile.display_name.clone(),
            })
            .collect(),
    ))
}

async fn query_conferences(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> AppResult<Json<Vec<ConferenceResponse>>> {
    let compiled = state.filter_compiler().compile(&request.filters)?;
    let plan = QueryPlanner::plan(compiled);
    let conferences = Conference::search(state.db(), &plan.to_sql()).await?;

    Ok(Json(with_organizer_names(&state, conferences).await?))
}

async fn conferences_attending(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
) -> AppResult<Json<Vec<ConferenceResponse>>> {
    let conferences = Conference::list_attending(state.db(), profile.id).await?;

    Ok(Json(with_organizer_names(&state, conferences).await?))
}

async fn register(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RegistrationResponse>> {
    state.reservations().register(profile.id, id).await?;

    Ok(Json(RegistrationResponse { accepted: true }))
}

async fn unregister(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UnregistrationResponse>> {
    let changed = state.reservations().unregister(profile.id, id).await?;

    Ok(Json(UnregistrationResponse { changed }))
}

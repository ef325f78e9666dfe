//! Speaker route handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::error::{AppError, AppResult};
use crate::models::{CreateSpeaker, Speaker};
use crate::state::AppState;

use super::helpers::CurrentUser;

/// Create the speaker router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/speaker", post(create_speaker))
        .route("/api/speakers", get(list_speakers))
}

async fn create_speaker(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
    Json(input): Json<CreateSpeaker>,
) -> AppResult<(StatusCode, Json<Speaker>)> {
    if input.first_name.trim().is_empty() || input.last_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "speaker first and last name are required".to_string(),
        ));
    }

    let speaker = Speaker::create(state.db(), profile.id, input).await?;

    Ok((StatusCode::CREATED, Json(speaker)))
}

async fn list_speakers(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
) -> AppResult<Json<Vec<Speaker>>> {
    Ok(Json(Speaker::list_by_owner(state.db(), profile.id).await?))
}

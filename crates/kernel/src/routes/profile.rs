//! Profile route handlers.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::error::AppResult;
use crate::models::{Profile, UpdateProfile};
use crate::state::AppState;

use super::helpers::CurrentUser;

/// Create the profile router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/profile", get(get_profile))
        .route("/api/profile", post(save_profile))
}

async fn get_profile(CurrentUser(profile): CurrentUser) -> Json<Profile> {
    // The extractor already created the profile if it was missing.
    Json(profile)
}

async fn save_profile(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
    Json(input): Json<UpdateProfile>,
) -> AppResult<Json<Profile>> {
    let updated = Profile::update(state.db(), profile.id, input).await?;

    // The per-instance lookup cache would otherwise serve the old name.
    state.invalidate_profile(&updated.main_email);

    Ok(Json(updated))
}

//! Derived-value route handlers.
//!
//! Read endpoints return whatever the cache currently holds; only the cron
//! tick and session creation recompute.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Header carrying the cron secret.
const CRON_KEY_HEADER: &str = "x-cron-key";

/// Response wrapper for derived messages.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Query parameters for the featured-speaker read.
///
/// The conference is optional; without it the endpoint answers with the
/// most recently featured speaker across all conferences.
#[derive(Debug, Deserialize)]
pub struct FeaturedSpeakerQuery {
    pub conference_id: Option<Uuid>,
}

/// Create the derived-value router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/announcement", get(get_announcement))
        .route("/api/featured-speaker", get(get_featured_speaker))
        .route("/api/cron/announcement", post(cron_announcement))
}

async fn get_announcement(State(state): State<AppState>) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: state.derived().announcement().await,
    })
}

async fn get_featured_speaker(
    State(state): State<AppState>,
    Query(query): Query<FeaturedSpeakerQuery>,
) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: state.derived().featured_speaker(query.conference_id).await,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn featured_speaker_query_parameter_is_optional() {
        let bare: FeaturedSpeakerQuery = serde_json::from_str("{}").unwrap();
        assert!(bare.conference_id.is_none());

        let id = Uuid::now_v7();
        let scoped: FeaturedSpeakerQuery =
            serde_json::from_str(&format!(r#"{{"conference_id": "{id}"}}"#)).unwrap();
        assert_eq!(scoped.conference_id, Some(id));
    }
}

async fn cron_announcement(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<MessageResponse>> {
    let key = headers
        .get(CRON_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if key != state.cron_key() {
        return Err(AppError::Forbidden("invalid cron key".to_string()));
    }

    let message = state.derived().recompute_announcement().await?;

    Ok(Json(MessageResponse { message }))
}

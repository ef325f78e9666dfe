//! Application error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("authorization required")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    /// A storage write conflict that survived the bounded retry policy.
    #[error("operation conflicted with concurrent updates, try again")]
    Transient,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Transient => StatusCode::SERVICE_UNAVAILABLE,
        };

        // Internal details are logged, never returned to the caller.
        let body = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal server error");
                "internal server error".to_string()
            }
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                "internal server error".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": body }))).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases: Vec<(AppError, StatusCode)> = vec![
            (
                AppError::BadRequest("bad filter".into()),
                StatusCode::BAD_REQUEST,
            ),
            (AppError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (
                AppError::Forbidden("owner only".into()),
                StatusCode::FORBIDDEN,
            ),
            (AppError::NotFound("conference"), StatusCode::NOT_FOUND),
            (
                AppError::Conflict("no seats available".into()),
                StatusCode::CONFLICT,
            ),
            (AppError::Transient, StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (err, expected) in cases {
            let response = err.into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn internal_details_redacted() {
        let err = AppError::Internal(anyhow::anyhow!("connection string leaked"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

//! Shared route helpers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::models::Profile;
use crate::state::AppState;

/// Header carrying the authenticated caller's email.
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// The authenticated caller's profile.
///
/// Identity arrives as an `X-User-Email` header set by the fronting auth
/// layer. The profile is created lazily the first time an email is seen and
/// cached per instance afterwards.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Profile);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let email = parts
            .headers
            .get(USER_EMAIL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(AppError::Unauthenticated)?
            .to_string();

        if let Some(profile) = state.cached_profile(&email) {
            return Ok(Self(profile));
        }

        let profile = Profile::ensure(state.db(), &email).await?;
        state.cache_profile(&profile);

        Ok(Self(profile))
    }
}

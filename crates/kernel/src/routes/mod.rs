//! HTTP route handlers.

pub mod conference;
pub mod derived;
pub mod health;
pub mod helpers;
pub mod profile;
pub mod session;
pub mod speaker;

use axum::Router;

use crate::state::AppState;

/// Assemble the full application router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(conference::router())
        .merge(session::router())
        .merge(speaker::router())
        .merge(profile::router())
        .merge(derived::router())
        .merge(health::router())
}

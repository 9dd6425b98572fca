pub mod auth;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/signup            signup (public)
/// /auth/login             login (public)
/// /auth/refresh           refresh (public, refresh cookie)
/// /auth/logout            logout (public, idempotent)
/// /auth/forgot-password   request a reset OTP (public)
/// /auth/reset-password    consume OTP + set new password (public)
/// /auth/me                profile (requires auth)
/// /auth/change-password   change password (requires auth)
/// ```
///
/// The public auth endpoints are expected to sit behind reverse-proxy rate
/// limits in deployment (signup/login ~5/15min, refresh ~10/15min,
/// forgot-password ~3/hour, keyed by client IP).
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/auth", auth::router())
}

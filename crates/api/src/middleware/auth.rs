//! Access-token authentication extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;

use mailblocks_core::error::CoreError;
use mailblocks_core::types::DbId;

use crate::auth::jwt::validate_access_token;
use crate::error::AppError;
use crate::handlers::auth::ACCESS_COOKIE;
use crate::state::AppState;

/// Authenticated user extracted from an access token.
///
/// The `Authorization: Bearer` header is checked first, falling back to the
/// `accessToken` cookie. Use this as an extractor parameter in any handler
/// that requires authentication:
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
}

/// Pull the access token out of the Authorization header or cookie.
fn extract_token(parts: &Parts) -> Option<String> {
    let header_token = parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if let Some(token) = header_token {
        return Some(token.to_string());
    }

    CookieJar::from_headers(&parts.headers)
        .get(ACCESS_COOKIE)
        .map(|c| c.value().to_string())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts).ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("No token provided".into()))
        })?;

        // Malformed, badly signed, expired, and wrong-kind tokens all get the
        // same response; the caller learns nothing about which check failed.
        let claims = validate_access_token(&token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
        })
    }
}

/// Like [`AuthUser`] but never rejects: anonymous or invalid-token requests
/// proceed with `user_id = None`. For routes that behave differently for
/// logged-in users.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser {
    pub user_id: Option<DbId>,
}

impl FromRequestParts<AppState> for OptionalAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = extract_token(parts)
            .and_then(|token| validate_access_token(&token, &state.config.jwt).ok())
            .map(|claims| claims.sub);

        Ok(OptionalAuthUser { user_id })
    }
}

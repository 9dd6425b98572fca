//! Handlers for the `/auth` resource: signup, login, refresh, logout,
//! profile, and the password-reset/change flows.
//!
//! Refresh tokens travel in the `refreshToken` httpOnly cookie (with a JSON
//! body fallback for non-browser clients) and are rotated on every use: the
//! stored session row is claimed atomically, so a replayed token fails with
//! the same 401 as an unknown one.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use mailblocks_core::error::CoreError;
use mailblocks_core::types::DbId;
use mailblocks_db::models::session::CreateSession;
use mailblocks_db::models::user::{CreateUser, UserResponse};
use mailblocks_db::repositories::{PasswordResetRepo, SessionRepo, UserRepo};

use crate::auth::jwt::{
    generate_access_token, generate_refresh_token, hash_token, validate_refresh_token,
};
use crate::auth::otp::{generate_otp, hash_otp};
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Cookie carrying the access token (also returned in the response body).
pub const ACCESS_COOKIE: &str = "accessToken";

/// Response to every forgot-password request, whether or not the email
/// exists and whether or not the OTP mail could be dispatched.
const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account exists with this email, an OTP has been sent";

/// Generic rejection for a missing, expired, or mismatched OTP challenge.
const INVALID_OTP_MESSAGE: &str = "Invalid or expired OTP";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/signup`.
///
/// Fields default to empty so missing-field validation produces the API's
/// 400 message instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Optional body for `POST /auth/refresh` and `POST /auth/logout`; the
/// cookie takes precedence when both are present.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Request body for `POST /auth/forgot-password`.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

/// Request body for `POST /auth/reset-password` (consolidated single-call flow).
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
    #[serde(default)]
    pub new_password: String,
}

/// Request body for `POST /auth/change-password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// Successful authentication response returned by signup and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserResponse,
    pub access_token: String,
}

/// Successful refresh response.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub message: String,
    pub access_token: String,
}

/// Generic `{message}` response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Response for `GET /auth/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/signup
///
/// Create a new account and log it in: returns 201 with the access token and
/// sets both auth cookies.
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(input): Json<SignupRequest>,
) -> AppResult<(StatusCode, CookieJar, Json<AuthResponse>)> {
    // 1. Validation.
    if input.name.is_empty() || input.email.is_empty() || input.password.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "All fields are required".into(),
        )));
    }
    validate_password_strength(&input.password)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let email = input.email.trim().to_lowercase();

    // 2. Pre-check for a friendly duplicate message. The unique index is
    //    authoritative; a race past this check maps to the same 400.
    if UserRepo::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Core(CoreError::Validation(
            "User already exists".into(),
        )));
    }

    // 3. Hash the password and create the user.
    let password_hash = hash_password(&input.password)
        .map_err(|e| {
            AppError::Core(CoreError::Internal(format!("Password hashing error: {e}")))
        })?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            email,
            name: input.name.trim().to_string(),
            password_hash,
        },
    )
    .await?;

    // 4. Issue tokens and persist the session record.
    let (ip, user_agent) = request_provenance(&headers);
    let (access_token, refresh_token) =
        issue_session(&state, user.id, ip, user_agent).await?;

    // 5. Set cookies and respond.
    let jar = apply_auth_cookies(jar, &state.config, &access_token, &refresh_token);

    tracing::info!(user_id = user.id, "User signed up");

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            message: "User created successfully".into(),
            user: UserResponse::from(&user),
            access_token,
        }),
    ))
}

/// POST /api/v1/auth/login
///
/// Authenticate with email + password. Unknown email and wrong password
/// produce the identical 401 so accounts cannot be enumerated.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    if input.email.is_empty() || input.password.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Email and password are required".into(),
        )));
    }

    // 1. Find user by email. Lookup is whitespace- and case-insensitive,
    //    matching the normalization applied at signup.
    let user = UserRepo::find_by_email(&state.pool, input.email.trim())
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Invalid credentials".into())))?;

    // 2. Verify password.
    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| {
            AppError::Core(CoreError::Internal(format!("Password verification error: {e}")))
        })?;

    if !password_valid {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid credentials".into(),
        )));
    }

    // 3. Opportunistically prune this user's expired sessions.
    let pruned = SessionRepo::delete_expired_for_user(&state.pool, user.id).await?;
    if pruned > 0 {
        tracing::debug!(user_id = user.id, pruned, "Pruned expired sessions");
    }

    // 4. Issue tokens and persist the new session.
    let (ip, user_agent) = request_provenance(&headers);
    let (access_token, refresh_token) =
        issue_session(&state, user.id, ip, user_agent).await?;

    let jar = apply_auth_cookies(jar, &state.config, &access_token, &refresh_token);

    tracing::info!(user_id = user.id, "User logged in");

    Ok((
        jar,
        Json(AuthResponse {
            message: "Login successful".into(),
            user: UserResponse::from(&user),
            access_token,
        }),
    ))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a valid refresh token for a new access + refresh pair. The old
/// token's session row is claimed atomically (rotation): exactly one of any
/// concurrent replays can succeed, and the rest must re-authenticate.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> AppResult<(CookieJar, Json<RefreshResponse>)> {
    // 1. Refresh token from cookie, falling back to the body.
    let refresh_token = extract_refresh_token(&jar, body.as_ref().map(|j| &j.0)).ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized("Refresh token not found".into()))
    })?;

    // 2. Verify signature, expiry, and kind.
    let claims = validate_refresh_token(&refresh_token, &state.config.jwt).map_err(|_| {
        AppError::Core(CoreError::Unauthorized("Invalid refresh token".into()))
    })?;

    // 3. Atomically claim the stored session. A token that was already
    //    rotated (or never issued) is indistinguishable from an expired one.
    let token_hash = hash_token(&refresh_token);
    let session = SessionRepo::claim_by_token_hash(&state.pool, &token_hash)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Refresh token not valid or expired".into(),
            ))
        })?;

    if session.user_id != claims.sub {
        // A signed token claiming one user but stored under another means
        // tampering or secret reuse; treat as any other invalid token.
        tracing::warn!(
            session_user = session.user_id,
            claim_user = claims.sub,
            "Refresh token subject mismatch"
        );
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid refresh token".into(),
        )));
    }

    // 4. The user must still exist.
    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    // 5. Issue a new pair and persist the replacement session.
    let (ip, user_agent) = request_provenance(&headers);
    let (access_token, new_refresh_token) =
        issue_session(&state, user.id, ip, user_agent).await?;

    let jar = apply_auth_cookies(jar, &state.config, &access_token, &new_refresh_token);

    Ok((
        jar,
        Json(RefreshResponse {
            message: "Token refreshed".into(),
            access_token,
        }),
    ))
}

/// POST /api/v1/auth/logout
///
/// Revoke the presented refresh token's session, if any, and clear both auth
/// cookies. Idempotent: never fails, even with no or garbage tokens.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    if let Some(refresh_token) = extract_refresh_token(&jar, body.as_ref().map(|j| &j.0)) {
        if validate_refresh_token(&refresh_token, &state.config.jwt).is_ok() {
            let token_hash = hash_token(&refresh_token);
            let removed = SessionRepo::delete_by_token_hash(&state.pool, &token_hash).await?;
            if removed {
                tracing::debug!("Session revoked on logout");
            }
        }
    }

    let jar = clear_auth_cookies(jar, &state.config);

    Ok((
        jar,
        Json(MessageResponse {
            message: "Logged out successfully".into(),
        }),
    ))
}

/// GET /api/v1/auth/me
///
/// Return the authenticated user's profile (no secrets).
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<MeResponse>> {
    let user = UserRepo::find_by_id(&state.pool, auth_user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "user",
            id: auth_user.user_id,
        }))?;

    Ok(Json(MeResponse {
        user: UserResponse::from(&user),
    }))
}

/// POST /api/v1/auth/forgot-password
///
/// Start a password reset. The response is the same generic 200 whether the
/// email exists or not, and whether or not the OTP mail could be dispatched;
/// dispatch failures are logged server-side only.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(input): Json<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    if input.email.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Email is required".into(),
        )));
    }

    if let Some(user) = UserRepo::find_by_email(&state.pool, input.email.trim()).await? {
        // Generate a fresh OTP, replacing any pending challenge.
        let otp = generate_otp();
        let expires_at = Utc::now() + chrono::Duration::minutes(state.config.otp_expiry_mins);

        PasswordResetRepo::upsert(&state.pool, user.id, &hash_otp(&otp), expires_at).await?;

        if let Err(e) = state
            .mailer
            .send_otp_email(&user.email, &user.name, &otp, state.config.otp_expiry_mins)
            .await
        {
            tracing::error!(user_id = user.id, error = %e, "Failed to send OTP email");
        }
    }

    Ok(Json(MessageResponse {
        message: FORGOT_PASSWORD_MESSAGE.into(),
    }))
}

/// POST /api/v1/auth/reset-password
///
/// Complete a password reset with email + OTP + new password in one call.
/// On success every session for the user is revoked, forcing re-login on
/// all devices.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(input): Json<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    if input.email.is_empty() || input.otp.is_empty() || input.new_password.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "All fields are required".into(),
        )));
    }
    validate_password_strength(&input.new_password)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    // Absent user, absent challenge, expired challenge, and wrong code all
    // collapse into one generic message.
    let invalid_otp = || AppError::Core(CoreError::Validation(INVALID_OTP_MESSAGE.into()));

    let user = UserRepo::find_by_email(&state.pool, input.email.trim())
        .await?
        .ok_or_else(invalid_otp)?;

    let challenge = PasswordResetRepo::find_by_user(&state.pool, user.id)
        .await?
        .ok_or_else(invalid_otp)?;

    if challenge.expires_at <= Utc::now() {
        return Err(invalid_otp());
    }
    if hash_otp(&input.otp) != challenge.code_hash {
        return Err(invalid_otp());
    }

    // Replace the password, consume the challenge, revoke everything.
    let password_hash = hash_password(&input.new_password)
        .map_err(|e| {
            AppError::Core(CoreError::Internal(format!("Password hashing error: {e}")))
        })?;

    UserRepo::update_password(&state.pool, user.id, &password_hash).await?;
    PasswordResetRepo::delete_for_user(&state.pool, user.id).await?;
    let revoked = SessionRepo::delete_all_for_user(&state.pool, user.id).await?;

    tracing::info!(user_id = user.id, revoked, "Password reset; all sessions revoked");

    Ok(Json(MessageResponse {
        message: "Password reset successfully".into(),
    }))
}

/// POST /api/v1/auth/change-password
///
/// Authenticated password change. Revokes every other session but keeps the
/// one tied to the requester's current refresh cookie, so the active device
/// is not logged out by its own password change.
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    jar: CookieJar,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    if input.old_password.is_empty() || input.new_password.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "All fields are required".into(),
        )));
    }
    validate_password_strength(&input.new_password)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let user = UserRepo::find_by_id(&state.pool, auth_user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "user",
            id: auth_user.user_id,
        }))?;

    let old_valid = verify_password(&input.old_password, &user.password_hash)
        .map_err(|e| {
            AppError::Core(CoreError::Internal(format!("Password verification error: {e}")))
        })?;

    if !old_valid {
        return Err(AppError::Core(CoreError::Validation(
            "Current password is incorrect".into(),
        )));
    }

    let password_hash = hash_password(&input.new_password)
        .map_err(|e| {
            AppError::Core(CoreError::Internal(format!("Password hashing error: {e}")))
        })?;

    UserRepo::update_password(&state.pool, user.id, &password_hash).await?;

    // Keep the requester's own session alive when its refresh cookie is
    // present and valid; otherwise revoke everything.
    let keep_hash = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| validate_refresh_token(t, &state.config.jwt).is_ok())
        .map(|t| hash_token(&t));

    let revoked = match keep_hash {
        Some(hash) => {
            SessionRepo::delete_all_for_user_except(&state.pool, user.id, &hash).await?
        }
        None => SessionRepo::delete_all_for_user(&state.pool, user.id).await?,
    };

    tracing::info!(user_id = user.id, revoked, "Password changed; other sessions revoked");

    Ok(Json(MessageResponse {
        message: "Password changed successfully".into(),
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Generate an access + refresh token pair and persist the session record.
async fn issue_session(
    state: &AppState,
    user_id: DbId,
    ip: Option<String>,
    user_agent: Option<String>,
) -> AppResult<(String, String)> {
    let access_token = generate_access_token(user_id, &state.config.jwt)
        .map_err(|e| {
            AppError::Core(CoreError::Internal(format!("Token generation error: {e}")))
        })?;

    let (refresh_token, refresh_hash) = generate_refresh_token(user_id, &state.config.jwt)
        .map_err(|e| {
            AppError::Core(CoreError::Internal(format!("Token generation error: {e}")))
        })?;

    let now = Utc::now();
    let session_input = CreateSession {
        user_id,
        refresh_token_hash: refresh_hash,
        issued_at: now,
        expires_at: now + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days),
        ip,
        user_agent,
    };
    SessionRepo::create(&state.pool, &session_input).await?;

    Ok((access_token, refresh_token))
}

/// Refresh token from the cookie jar, falling back to the JSON body.
fn extract_refresh_token(jar: &CookieJar, body: Option<&RefreshRequest>) -> Option<String> {
    jar.get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| body.and_then(|b| b.refresh_token.clone()))
}

/// Provenance metadata recorded on the session row; informational only.
fn request_provenance(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    (ip, user_agent)
}

/// Build one auth cookie with the configured attributes.
fn build_cookie(
    config: &ServerConfig,
    name: &'static str,
    value: String,
    max_age: time::Duration,
) -> Cookie<'static> {
    let mut builder = Cookie::build((name, value))
        .http_only(true)
        .secure(config.cookie.secure)
        .same_site(config.cookie.same_site)
        .path("/")
        .max_age(max_age);

    if let Some(domain) = &config.cookie.domain {
        builder = builder.domain(domain.clone());
    }

    builder.build()
}

/// Set both auth cookies with max-age matching each token's signed lifetime.
fn apply_auth_cookies(
    jar: CookieJar,
    config: &ServerConfig,
    access_token: &str,
    refresh_token: &str,
) -> CookieJar {
    let access = build_cookie(
        config,
        ACCESS_COOKIE,
        access_token.to_string(),
        time::Duration::minutes(config.jwt.access_token_expiry_mins),
    );
    let refresh = build_cookie(
        config,
        REFRESH_COOKIE,
        refresh_token.to_string(),
        time::Duration::days(config.jwt.refresh_token_expiry_days),
    );
    jar.add(access).add(refresh)
}

/// Clear both auth cookies using the same attributes they were set with.
fn clear_auth_cookies(jar: CookieJar, config: &ServerConfig) -> CookieJar {
    let access = build_cookie(config, ACCESS_COOKIE, String::new(), time::Duration::ZERO);
    let refresh = build_cookie(config, REFRESH_COOKIE, String::new(), time::Duration::ZERO);
    jar.remove(access).remove(refresh)
}

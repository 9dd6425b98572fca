//! Signed token generation/validation and refresh-token storage hashing.
//!
//! Both access and refresh tokens are HS256-signed JWTs carrying a [`Claims`]
//! payload with a `typ` discriminator, signed with *independent* secrets so a
//! leaked access-signing key cannot forge refresh tokens or vice versa.
//! Refresh tokens are additionally hashed with SHA-256 before storage so a
//! database leak does not compromise active sessions.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use mailblocks_core::types::DbId;

/// Discriminates access tokens from refresh tokens inside the signed payload.
///
/// A token presented at the wrong boundary (e.g. a refresh token sent as a
/// bearer credential) fails validation even though its signature would check
/// out against the other secret's verifier.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims embedded in every issued token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    /// Token kind (`"access"` or `"refresh"`).
    pub typ: TokenKind,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4) for audit.
    pub jti: String,
}

/// Configuration for token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret for access tokens.
    pub access_secret: String,
    /// HMAC-SHA256 secret for refresh tokens (must differ from `access_secret`).
    pub refresh_secret: String,
    /// Access token lifetime in minutes (default: 15).
    pub access_token_expiry_mins: i64,
    /// Refresh token lifetime in days (default: 7).
    pub refresh_token_expiry_days: i64,
}

/// Default access token expiry in minutes.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;
/// Default refresh token expiry in days.
const DEFAULT_REFRESH_EXPIRY_DAYS: i64 = 7;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                    | Required | Default |
    /// |----------------------------|----------|---------|
    /// | `JWT_ACCESS_SECRET`        | **yes**  | --      |
    /// | `JWT_REFRESH_SECRET`       | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS`   | no       | `15`    |
    /// | `JWT_REFRESH_EXPIRY_DAYS`  | no       | `7`     |
    ///
    /// # Panics
    ///
    /// Panics if either secret is unset or empty.
    pub fn from_env() -> Self {
        let access_secret = std::env::var("JWT_ACCESS_SECRET")
            .expect("JWT_ACCESS_SECRET must be set in the environment");
        assert!(!access_secret.is_empty(), "JWT_ACCESS_SECRET must not be empty");

        let refresh_secret = std::env::var("JWT_REFRESH_SECRET")
            .expect("JWT_REFRESH_SECRET must be set in the environment");
        assert!(!refresh_secret.is_empty(), "JWT_REFRESH_SECRET must not be empty");

        let access_token_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64");

        let refresh_token_expiry_days: i64 = std::env::var("JWT_REFRESH_EXPIRY_DAYS")
            .unwrap_or_else(|_| DEFAULT_REFRESH_EXPIRY_DAYS.to_string())
            .parse()
            .expect("JWT_REFRESH_EXPIRY_DAYS must be a valid i64");

        Self {
            access_secret,
            refresh_secret,
            access_token_expiry_mins,
            refresh_token_expiry_days,
        }
    }
}

fn sign(
    user_id: DbId,
    typ: TokenKind,
    lifetime_secs: i64,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        typ,
        exp: now + lifetime_secs,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

fn verify(
    token: &str,
    expected: TokenKind,
    secret: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;

    if token_data.claims.typ != expected {
        return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
    }
    Ok(token_data.claims)
}

/// Generate a short-lived access token for the given user.
pub fn generate_access_token(
    user_id: DbId,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    sign(
        user_id,
        TokenKind::Access,
        config.access_token_expiry_mins * 60,
        &config.access_secret,
    )
}

/// Generate a refresh token for the given user.
///
/// Returns `(plaintext_token, sha256_hex_hash)`. The plaintext is sent to the
/// client exactly once; only the hash is persisted server-side.
pub fn generate_refresh_token(
    user_id: DbId,
    config: &JwtConfig,
) -> Result<(String, String), jsonwebtoken::errors::Error> {
    let plaintext = sign(
        user_id,
        TokenKind::Refresh,
        config.refresh_token_expiry_days * 24 * 60 * 60,
        &config.refresh_secret,
    )?;
    let hash = hash_token(&plaintext);
    Ok((plaintext, hash))
}

/// Validate an access token, returning the embedded [`Claims`].
///
/// Fails on a malformed token, wrong signature, expiry, or a `typ` claim
/// other than `access`.
pub fn validate_access_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    verify(token, TokenKind::Access, &config.access_secret)
}

/// Validate a refresh token, returning the embedded [`Claims`].
///
/// Same failure policy as [`validate_access_token`], using the refresh secret
/// and requiring `typ == refresh`.
pub fn validate_refresh_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    verify(token, TokenKind::Refresh, &config.refresh_secret)
}

/// Compute the SHA-256 hex digest of a refresh token.
///
/// Used only for session storage/lookup -- never for passwords.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

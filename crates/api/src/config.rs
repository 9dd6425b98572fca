use axum_extra::extract::cookie::SameSite;

use crate::auth::jwt::JwtConfig;
use crate::auth::otp::DEFAULT_OTP_EXPIRY_MINS;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secrets have sensible defaults suitable for
/// local development. In production, override via environment variables.
/// Rate limiting for the auth endpoints is a deployment concern (reverse
/// proxy), not configured here.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secrets, expiry durations).
    pub jwt: JwtConfig,
    /// Cookie attributes for the auth cookies.
    pub cookie: CookieConfig,
    /// Password-reset OTP lifetime in minutes (default: `10`).
    pub otp_expiry_mins: i64,
}

/// Attributes applied to the `refreshToken`/`accessToken` cookies.
///
/// Resolved once at startup; both cookies are always httpOnly with path `/`,
/// and max-age equals the corresponding token lifetime.
#[derive(Debug, Clone)]
pub struct CookieConfig {
    /// Send cookies only over HTTPS (`COOKIE_SECURE`, default `false`).
    pub secure: bool,
    /// `Strict` when secure, `Lax` otherwise.
    pub same_site: SameSite,
    /// Optional cookie domain (`COOKIE_DOMAIN`).
    pub domain: Option<String>,
}

impl CookieConfig {
    /// Load cookie attributes from environment variables.
    ///
    /// | Env Var         | Default |
    /// |-----------------|---------|
    /// | `COOKIE_SECURE` | `false` |
    /// | `COOKIE_DOMAIN` | --      |
    pub fn from_env() -> Self {
        let secure: bool = std::env::var("COOKIE_SECURE")
            .unwrap_or_else(|_| "false".into())
            .parse()
            .expect("COOKIE_SECURE must be true or false");

        Self {
            secure,
            same_site: if secure { SameSite::Strict } else { SameSite::Lax },
            domain: std::env::var("COOKIE_DOMAIN").ok(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `OTP_EXPIRY_MINS`      | `10`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let otp_expiry_mins: i64 = std::env::var("OTP_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_OTP_EXPIRY_MINS.to_string())
            .parse()
            .expect("OTP_EXPIRY_MINS must be a valid i64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            cookie: CookieConfig::from_env(),
            otp_expiry_mins,
        }
    }
}

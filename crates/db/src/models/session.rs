//! Refresh-token session model and DTOs.

use sqlx::FromRow;

use mailblocks_core::types::{DbId, Timestamp};

/// A session row from the `user_sessions` table.
///
/// One row per outstanding refresh token. `ip` and `user_agent` are
/// provenance metadata only and carry no access-control weight.
#[derive(Debug, Clone, FromRow)]
pub struct UserSession {
    pub id: DbId,
    pub user_id: DbId,
    pub refresh_token_hash: String,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for creating a new session.
pub struct CreateSession {
    pub user_id: DbId,
    pub refresh_token_hash: String,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

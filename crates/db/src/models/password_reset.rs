//! Pending password-reset challenge model.

use sqlx::FromRow;

use mailblocks_core::types::{DbId, Timestamp};

/// The single pending OTP challenge for a user, from `password_resets`.
///
/// Stores only the SHA-256 hash of the code; expiry is checked at use time.
#[derive(Debug, Clone, FromRow)]
pub struct PasswordReset {
    pub user_id: DbId,
    pub code_hash: String,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}

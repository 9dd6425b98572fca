//! Repository for the `password_resets` table.

use sqlx::PgPool;

use mailblocks_core::types::{DbId, Timestamp};

use crate::models::password_reset::PasswordReset;

const COLUMNS: &str = "user_id, code_hash, expires_at, created_at";

/// Provides operations for pending password-reset challenges.
pub struct PasswordResetRepo;

impl PasswordResetRepo {
    /// Create or replace the pending challenge for a user.
    ///
    /// `user_id` is the primary key, so a new forgot-password request
    /// discards any previous challenge in the same statement.
    pub async fn upsert(
        pool: &PgPool,
        user_id: DbId,
        code_hash: &str,
        expires_at: Timestamp,
    ) -> Result<PasswordReset, sqlx::Error> {
        let query = format!(
            "INSERT INTO password_resets (user_id, code_hash, expires_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id) DO UPDATE
                SET code_hash = EXCLUDED.code_hash,
                    expires_at = EXCLUDED.expires_at,
                    created_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PasswordReset>(&query)
            .bind(user_id)
            .bind(code_hash)
            .bind(expires_at)
            .fetch_one(pool)
            .await
    }

    /// Find the pending challenge for a user, expired or not.
    ///
    /// Expiry is the caller's decision so an expired challenge can produce
    /// the same generic error as a missing one.
    pub async fn find_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<PasswordReset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM password_resets WHERE user_id = $1");
        sqlx::query_as::<_, PasswordReset>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Remove the pending challenge for a user. Returns `true` if one existed.
    pub async fn delete_for_user(pool: &PgPool, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM password_resets WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

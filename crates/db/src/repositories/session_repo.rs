//! Repository for the `user_sessions` table.
//!
//! Every mutation here is a single SQL statement keyed by the refresh-token
//! hash or user id, so concurrent refreshes serialize at the database and
//! never race through an application-level read-modify-write.

use sqlx::PgPool;

use mailblocks_core::types::DbId;

use crate::models::session::{CreateSession, UserSession};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, user_id, refresh_token_hash, issued_at, expires_at, ip, user_agent, created_at";

/// Provides operations for refresh-token sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateSession) -> Result<UserSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_sessions (user_id, refresh_token_hash, issued_at, expires_at, ip, user_agent)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(input.user_id)
            .bind(&input.refresh_token_hash)
            .bind(input.issued_at)
            .bind(input.expires_at)
            .bind(&input.ip)
            .bind(&input.user_agent)
            .fetch_one(pool)
            .await
    }

    /// Atomically claim (delete and return) the unexpired session matching a
    /// refresh-token hash.
    ///
    /// This is the rotation primitive: a refresh token is single-use, and
    /// under concurrent replay of the same token exactly one caller receives
    /// the row -- the rest see `None` and must re-authenticate.
    pub async fn claim_by_token_hash(
        pool: &PgPool,
        hash: &str,
    ) -> Result<Option<UserSession>, sqlx::Error> {
        let query = format!(
            "DELETE FROM user_sessions
             WHERE refresh_token_hash = $1 AND expires_at > NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(hash)
            .fetch_optional(pool)
            .await
    }

    /// Delete the session matching a refresh-token hash regardless of expiry.
    ///
    /// Used by logout, which is idempotent. Returns `true` if a row was removed.
    pub async fn delete_by_token_hash(pool: &PgPool, hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE refresh_token_hash = $1")
            .bind(hash)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete all sessions for a user (global revoke). Returns the count removed.
    pub async fn delete_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete all sessions for a user except the one matching `keep_hash`.
    ///
    /// Used by change-password so the requesting device stays logged in while
    /// every other session is revoked.
    pub async fn delete_all_for_user_except(
        pool: &PgPool,
        user_id: DbId,
        keep_hash: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM user_sessions WHERE user_id = $1 AND refresh_token_hash <> $2",
        )
        .bind(user_id)
        .bind(keep_hash)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Lazily prune a user's expired sessions. Returns the count removed.
    ///
    /// Called opportunistically on login; expiry is otherwise only checked
    /// at use time, never by a background sweeper.
    pub async fn delete_expired_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM user_sessions WHERE user_id = $1 AND expires_at <= NOW()")
                .bind(user_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }

    /// Count a user's sessions. Used by tests to observe revocation effects.
    pub async fn count_for_user(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM user_sessions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }
}

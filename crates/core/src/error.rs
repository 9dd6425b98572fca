use crate::types::DbId;

/// Domain-level failure taxonomy shared by every crate in the workspace.
///
/// Each variant corresponds to one HTTP status the API layer renders:
/// 404, 400, 409, 401, and 500 (with the internal message sanitized away).
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A crypto or token-codec failure the client can do nothing about.
    /// The message is for logs only and never reaches the response body.
    #[error("Internal error: {0}")]
    Internal(String),
}

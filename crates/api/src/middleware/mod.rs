//! Authentication middleware extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from an access token.
//! - [`auth::OptionalAuthUser`] -- Same, but never rejects the request.

pub mod auth;

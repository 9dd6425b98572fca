//! Request handlers.
//!
//! Handlers delegate to the repositories in `mailblocks_db` and map errors
//! via [`crate::error::AppError`].

pub mod auth;

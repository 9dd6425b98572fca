//! Shared domain primitives for the mailblocks backend.
//!
//! - [`error::CoreError`] -- domain-level error taxonomy shared by all crates.
//! - [`types`] -- primitive type aliases (`DbId`, `Timestamp`).

pub mod error;
pub mod types;

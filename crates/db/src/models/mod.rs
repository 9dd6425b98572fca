//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A create DTO for inserts where the insert takes more than a couple of fields

pub mod password_reset;
pub mod session;
pub mod user;

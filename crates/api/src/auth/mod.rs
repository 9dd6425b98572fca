//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- signed access/refresh token generation, validation, and storage hashing.
//! - [`otp`] -- one-time numeric codes for password reset.

pub mod jwt;
pub mod otp;
pub mod password;

//! One-time codes for the password-reset flow.
//!
//! Codes are 6-digit, zero-padded, uniformly distributed numeric strings.
//! Only a SHA-256 digest is stored; the code itself travels by email and is
//! short-lived and rate-limited, so a fast digest is an acceptable storage
//! hash here (unlike passwords, which use Argon2id).

use rand::Rng;
use sha2::{Digest, Sha256};

/// Default OTP lifetime in minutes.
pub const DEFAULT_OTP_EXPIRY_MINS: i64 = 10;

/// Generate a random 6-digit OTP, zero-padded (e.g. `"042517"`).
pub fn generate_otp() -> String {
    let code: u32 = rand::rng().random_range(0..1_000_000);
    format!("{code:06}")
}

/// Compute the SHA-256 hex digest of an OTP for storage comparison.
pub fn hash_otp(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_is_six_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6, "OTP must always be 6 characters: {otp}");
            assert!(
                otp.chars().all(|c| c.is_ascii_digit()),
                "OTP must be numeric: {otp}"
            );
        }
    }

    #[test]
    fn test_otp_hash_is_stable() {
        let otp = generate_otp();
        assert_eq!(hash_otp(&otp), hash_otp(&otp));
        assert_eq!(hash_otp(&otp).len(), 64);
    }

    #[test]
    fn test_different_codes_hash_differently() {
        assert_ne!(hash_otp("000000"), hash_otp("000001"));
    }
}

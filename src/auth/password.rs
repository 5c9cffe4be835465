//! Password Hashing
//! Mission: Derive and check salted bcrypt credentials

use anyhow::{Context, Result};
use bcrypt::{hash, verify};

/// bcrypt hash of an unguessable filler password. Verified against when a
/// username lookup misses, so failed logins cost the same whether or not
/// the username exists.
const DUMMY_HASH: &str = "$2a$10$N9qo8uLOickgx2ZMRZoMyeIjZAgcfl7p92ldGxad68LJZdL17lhWy";

/// Hash a password with the configured cost. The salt is generated per call
/// and embedded in the output alongside the cost parameters.
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    hash(password, cost).context("Failed to hash password")
}

/// Recompute the hash from the stored parameters and compare in constant
/// time. bcrypt's verify reads salt and cost out of the stored string.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    verify(password, stored_hash).context("Failed to verify password")
}

/// Burn one bcrypt verification against a fixed hash.
pub fn dummy_verify(password: &str) {
    let _ = verify(password, DUMMY_HASH);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum bcrypt cost keeps these tests fast.
    const TEST_COST: u32 = 4;

    #[test]
    fn test_hash_and_verify() {
        let hashed = hash_password("hunter2-hotel", TEST_COST).unwrap();
        assert!(verify_password("hunter2-hotel", &hashed).unwrap());
        assert!(!verify_password("wrong-password", &hashed).unwrap());
    }

    #[test]
    fn test_same_password_distinct_salts() {
        let first = hash_password("hunter2-hotel", TEST_COST).unwrap();
        let second = hash_password("hunter2-hotel", TEST_COST).unwrap();

        assert_ne!(first, second);
        assert!(verify_password("hunter2-hotel", &first).unwrap());
        assert!(verify_password("hunter2-hotel", &second).unwrap());
    }

    #[test]
    fn test_dummy_verify_never_panics() {
        dummy_verify("anything");
        dummy_verify("");
    }
}

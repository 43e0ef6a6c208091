//! One-way salted password hashing.

use anyhow::{Context, Result};

/// Fixed bcrypt cost for all accounts.
const BCRYPT_COST: u32 = 10;

/// Hash a plaintext secret. A fresh random salt is folded into each call, so
/// two hashes of the same secret differ.
pub fn hash_password(secret: &str) -> Result<String> {
    bcrypt::hash(secret, BCRYPT_COST).context("failed to hash password")
}

/// Constant-time verification of a plaintext secret against a stored hash.
///
/// Mismatch is `Ok(false)`; an error only means the stored hash itself is
/// malformed, which should never happen for data we wrote.
pub fn verify_password(secret: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(secret, hash).context("stored password hash is malformed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("secret1").unwrap();
        assert!(verify_password("secret1", &hash).unwrap());
        assert!(!verify_password("secret2", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("secret1").unwrap();
        let second = hash_password("secret1").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("secret1", "not-a-bcrypt-hash").is_err());
    }
}

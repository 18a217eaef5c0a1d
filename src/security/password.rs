//! Password hashing.
//!
//! # Design Decisions
//! - Stored format: argon2id PHC string with a fresh random salt
//! - Parameters travel inside the stored string, so changing defaults
//!   never invalidates existing hashes
//! - Unparseable hashes never verify

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::Argon2;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordError(String);

/// Hashes and verifies user passwords.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, PasswordError>;
    fn verify(&self, password: &str, stored: &str) -> bool;
}

/// Argon2id with the crate's default parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError(e.to_string()))
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored) else {
            return false;
        };
        Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = Argon2Hasher;
        let stored = hasher.hash("secret1").unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(!stored.contains("secret1"));
        assert!(hasher.verify("secret1", &stored));
        assert!(!hasher.verify("secret2", &stored));
    }

    #[test]
    fn test_salt_differs_per_hash() {
        let hasher = Argon2Hasher;
        assert_ne!(hasher.hash("secret1").unwrap(), hasher.hash("secret1").unwrap());
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        let hasher = Argon2Hasher;
        assert!(!hasher.verify("secret1", ""));
        assert!(!hasher.verify("secret1", "secret1"));
        assert!(!hasher.verify("secret1", "$argon2id$v=19$m=19456,t=2,p=1$bm90LWEtc2FsdA"));
    }
}

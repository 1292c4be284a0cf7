//! Argon2id credential hashing.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use warden_core::{DomainError, DomainResult};

/// Hash a plaintext password with a fresh salt.
pub fn hash_password(plain: &str) -> DomainResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DomainError::storage(format!("password hashing failed: {e}")))
}

/// Verify a plaintext password against a stored hash.
///
/// Malformed stored hashes verify as false rather than erroring; a user
/// with a corrupt credential row simply cannot log in.
pub fn verify_password(plain: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("string").unwrap();
        assert!(verify_password("string", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("string").unwrap();
        let b = hash_password("string").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_stored_hash_is_just_false() {
        assert!(!verify_password("string", "not-a-phc-string"));
    }
}

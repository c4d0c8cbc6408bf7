//! PIN hashing capability
//!
//! Agents authenticate offline against the stored one-way hash. The
//! capability is pluggable; [`Argon2Hasher`] is the default.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use shared::error::{AppError, AppResult};

pub trait CredentialHasher: Send + Sync {
    /// One-way hash of `secret`
    fn hash(&self, secret: &str) -> AppResult<String>;

    /// Whether `secret` matches `hash`. Malformed hashes never match.
    fn verify(&self, secret: &str, hash: &str) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, secret: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Failed to hash PIN: {e}")))?;
        Ok(hash.to_string())
    }

    fn verify(&self, secret: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    }
}

/// 4 to 6 ASCII digits
pub fn validate_pin(pin: &str) -> AppResult<()> {
    if !(4..=6).contains(&pin.len()) || !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::validation("PIN must be 4 to 6 digits"));
    }
    Ok(())
}

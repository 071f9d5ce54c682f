//! Password value object.
//!
//! Argon2 hashing and verification for doctor accounts.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;

use crate::config::MIN_PASSWORD_LENGTH;
use crate::errors::{AppError, AppResult};

/// Hash of a throwaway password, verified against when a login names an
/// unknown user so both paths cost one Argon2 verification.
static DECOY_HASH: Lazy<String> =
    Lazy::new(|| Password::hash("decoy-password-never-issued").unwrap_or_default());

/// Hashed password.
#[derive(Clone, PartialEq, Eq)]
pub struct Password {
    hash: String,
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Hash a new plain-text password.
    ///
    /// # Errors
    /// Returns a validation error if the password is shorter than
    /// `MIN_PASSWORD_LENGTH`.
    pub fn new(plain_text: &str) -> AppResult<Self> {
        if plain_text.chars().count() < MIN_PASSWORD_LENGTH as usize {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        Ok(Self {
            hash: Self::hash(plain_text)?,
        })
    }

    /// Wrap a stored hash.
    pub fn from_hash(hash: String) -> Self {
        Self { hash }
    }

    /// Password whose verification always fails but costs the same as a real one.
    pub fn decoy() -> Self {
        Self::from_hash(DECOY_HASH.clone())
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }

    pub fn into_string(self) -> String {
        self.hash
    }

    /// Verify a plain-text password against this hash.
    pub fn verify(&self, plain_text: &str) -> bool {
        match PasswordHash::new(&self.hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(plain_text.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!("Stored password hash is malformed: {}", e);
                false
            }
        }
    }

    fn hash(plain_text: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plain_text.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AppError::internal(format!("Password hash failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let password = Password::new("SecurePassword123!").unwrap();

        assert!(password.verify("SecurePassword123!"));
        assert!(!password.verify("WrongPassword123"));
    }

    #[test]
    fn test_password_from_stored_hash() {
        let hash = Password::new("TestPassword123").unwrap().into_string();
        assert!(Password::from_hash(hash).verify("TestPassword123"));
    }

    #[test]
    fn test_same_password_different_salts() {
        let first = Password::new("SamePassword123").unwrap();
        let second = Password::new("SamePassword123").unwrap();

        assert_ne!(first.as_str(), second.as_str());
        assert!(first.verify("SamePassword123"));
        assert!(second.verify("SamePassword123"));
    }

    #[test]
    fn test_password_length_rule() {
        assert!(Password::new("short").is_err());
        assert!(Password::new("12345678").is_ok());
    }

    #[test]
    fn test_decoy_never_verifies() {
        let decoy = Password::decoy();
        assert!(!decoy.verify("decoy"));
        assert!(!decoy.verify(""));
    }

    #[test]
    fn test_malformed_hash_fails_closed() {
        assert!(!Password::from_hash("not-a-hash".into()).verify("anything"));
    }
}

use std::sync::OnceLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as _;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Argon2;

use super::errors::PasswordError;

const DUMMY_PASSWORD: &str = "dummy-password-for-unknown-accounts";

/// Argon2id password hasher producing PHC strings.
///
/// Credential checks go through [`PasswordHasher::verify`], which reports a
/// mismatch as `Ok(false)` so callers can fold it into a generic credential failure.
#[derive(Clone, Default)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    dummy_hash: OnceLock<String>,
}

impl PasswordHasher {
    /// Create a hasher with Argon2id default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash a plaintext password with a fresh random salt.
    ///
    /// # Errors
    /// * `HashingFailed` - Argon2 rejected the input or parameters
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Check a plaintext password against a stored PHC hash.
    ///
    /// # Errors
    /// * `MalformedHash` - Stored hash is not a PHC string
    pub fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
        let parsed =
            PasswordHash::new(stored_hash).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;

        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Verify `password` against a throwaway hash and discard the outcome.
    ///
    /// Gives a credential check for an unknown account the same Argon2 cost
    /// as one for a real account.
    pub fn verify_dummy(&self, password: &str) {
        let dummy_hash = self
            .dummy_hash
            .get_or_init(|| self.hash(DUMMY_PASSWORD).unwrap_or_default());

        if let Err(e) = self.verify(password, dummy_hash) {
            tracing::warn!(error = %e, "Dummy password verification failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_argon2id_phc() {
        let hash = PasswordHasher::new()
            .hash("Secr3t!pass")
            .expect("Failed to hash password");
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_verify_matches_only_original_password() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash("Secr3t!pass").expect("Failed to hash password");

        assert_eq!(hasher.verify("Secr3t!pass", &hash), Ok(true));
        assert_eq!(hasher.verify("secr3t!pass", &hash), Ok(false));
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let hasher = PasswordHasher::new();
        let first = hasher.hash("Secr3t!pass").unwrap();
        let second = hasher.hash("Secr3t!pass").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_dummy_reuses_one_hash() {
        let hasher = PasswordHasher::new();

        hasher.verify_dummy("Secr3t!pass");
        let first = hasher.dummy_hash.get().cloned().expect("dummy hash initialized");
        hasher.verify_dummy("other");

        assert!(first.starts_with("$argon2id$"));
        assert_eq!(hasher.dummy_hash.get(), Some(&first));
    }

    #[test]
    fn test_verify_malformed_hash() {
        let result = PasswordHasher::new().verify("password", "plaintext-not-phc");
        assert!(matches!(result, Err(PasswordError::MalformedHash(_))));
    }
}

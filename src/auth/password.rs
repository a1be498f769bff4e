use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::error::{Error, Result};

const ARGON2_MEMORY: u32 = 64 * 1024; // KiB
const ARGON2_ITERATIONS: u32 = 1;
const ARGON2_PARALLELISM: u32 = 4;
const ARGON2_OUTPUT_LEN: usize = 32;

const GENERATED_PASSWORD_LEN: usize = 32;

// The application verifies account passwords with bcrypt at its default cost
const ACCOUNT_BCRYPT_COST: u32 = 10;

/// Hashes and verifies principal passwords for the embedded engine.
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialHasher {
    #[must_use]
    pub fn new() -> Self {
        let params = Params::new(
            ARGON2_MEMORY,
            ARGON2_ITERATIONS,
            ARGON2_PARALLELISM,
            Some(ARGON2_OUTPUT_LEN),
        )
        .unwrap_or_default();

        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Hashes a password using Argon2id
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Config(format!("failed to hash password: {e}")))?;
        Ok(hash.to_string())
    }

    /// Verifies a password against a stored PHC hash
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| Error::Config(format!("invalid hash format: {e}")))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Config(format!("failed to verify password: {e}"))),
        }
    }
}

/// Hashes an application account password in the bcrypt format the
/// application verifies logins against.
pub fn hash_account_password(password: &str) -> Result<String> {
    bcrypt::hash(password, ACCOUNT_BCRYPT_COST)
        .map_err(|e| Error::Config(format!("failed to hash account password: {e}")))
}

/// Generates a random alphanumeric secret suitable for an API credential.
#[must_use]
pub fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_correct_password() {
        let hasher = CredentialHasher::new();
        let hash = hasher.hash("s3cret").unwrap();
        assert!(hasher.verify("s3cret", &hash).unwrap());
    }

    #[test]
    fn test_verify_wrong_password() {
        let hasher = CredentialHasher::new();
        let hash = hasher.hash("s3cret").unwrap();
        assert!(!hasher.verify("s3cret!", &hash).unwrap());
    }

    #[test]
    fn test_hash_is_phc_format() {
        let hasher = CredentialHasher::new();
        let hash = hasher.hash("s3cret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_account_password_is_bcrypt() {
        let hash = hash_account_password("manager-secret").unwrap();
        assert!(hash.starts_with("$2b$10$"));
        assert!(bcrypt::verify("manager-secret", &hash).unwrap());
        assert!(!bcrypt::verify("manager-secret!", &hash).unwrap());
    }

    #[test]
    fn test_generated_passwords_are_random() {
        let a = generate_password();
        let b = generate_password();
        assert_eq!(a.len(), GENERATED_PASSWORD_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}

//! Password credential hashing.

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString, rand_core::OsRng,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque hashed secret stored on a user record.
///
/// `Debug` never prints the hash.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordCredential(String);

impl PasswordCredential {
    /// Wrap an already-hashed value (e.g. loaded from storage).
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for PasswordCredential {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("PasswordCredential(<redacted>)")
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordHashError {
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Hash/verify contract for user credentials.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<PasswordCredential, PasswordHashError>;

    /// `true` when `plaintext` matches the stored credential.
    fn verify(&self, credential: &PasswordCredential, plaintext: &str) -> bool;
}

/// Argon2id with the crate's default parameters and a random salt per hash.
#[derive(Debug, Default, Clone)]
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plaintext: &str) -> Result<PasswordCredential, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| PasswordHashError::Hashing(e.to_string()))?;
        Ok(PasswordCredential(hash.to_string()))
    }

    fn verify(&self, credential: &PasswordCredential, plaintext: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(credential.as_str()) else {
            return false;
        };
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

//! Password hashing.

use std::fmt;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{self, SaltString, rand_core::OsRng},
};
use thiserror::Error;
use tokio::task::{self, JoinError};

use crate::errors::{Classify, FailureKind, capture_internal};

/// Every variant is logged with a backtrace when it is built.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(password_hash::Error),

    #[error("password hashing task failed")]
    Task(JoinError),
}

impl PasswordError {
    fn hash(context: &str, source: password_hash::Error) -> Self {
        Self::Hash(capture_internal(context, source))
    }

    fn task(context: &str, source: JoinError) -> Self {
        Self::Task(capture_internal(context, source))
    }
}

impl Classify for PasswordError {
    fn kind(&self) -> FailureKind {
        FailureKind::Internal
    }
}

/// Self-describing Argon2id PHC string, salt and parameters included.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    #[must_use]
    pub const fn from_stored(phc: String) -> Self {
        Self(phc)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hash `plaintext` with a fresh random salt.
    ///
    /// Deliberately slow; call [`hash_password`] from async code.
    ///
    /// # Errors
    ///
    /// Returns an error if the hasher rejects its input.
    pub fn from_plaintext(plaintext: &str) -> Result<Self, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let phc = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|source| PasswordError::hash("password.hash", source))?;

        Ok(Self(phc.to_string()))
    }

    /// Check `plaintext` against this digest.
    ///
    /// A wrong password is `Ok(false)`, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored digest cannot be parsed.
    pub fn matches(&self, plaintext: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(&self.0)
            .map_err(|source| PasswordError::hash("password.parse", source))?;

        match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(source) => Err(PasswordError::hash("password.verify", source)),
        }
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(**redacted**)")
    }
}

/// Hash on the blocking pool.
///
/// # Errors
///
/// Returns an error if hashing fails or the blocking task panics.
pub async fn hash_password(plaintext: String) -> Result<PasswordDigest, PasswordError> {
    task::spawn_blocking(move || PasswordDigest::from_plaintext(&plaintext))
        .await
        .map_err(|source| PasswordError::task("password.hash", source))?
}

/// Verify on the blocking pool.
///
/// # Errors
///
/// Returns an error if the digest is unreadable or the blocking task panics.
pub async fn verify_password(
    digest: PasswordDigest,
    plaintext: String,
) -> Result<bool, PasswordError> {
    task::spawn_blocking(move || digest.matches(&plaintext))
        .await
        .map_err(|source| PasswordError::task("password.verify", source))?
}

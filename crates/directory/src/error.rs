//! Directory error taxonomy.

use thiserror::Error;

use hcm_auth::{AuthzError, PasswordHashError};
use hcm_core::DomainError;

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Outcome of a failed directory operation, for the boundary to translate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The target employee does not exist.
    #[error("employee not found")]
    NotFound,

    /// The caller was resolved but policy denies the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The authenticated principal has no record in the directory.
    #[error("caller is not registered in the directory")]
    CallerNotFound,

    /// Input is malformed or clashes with a uniqueness rule.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// The record changed between read and write; retrying may succeed.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Persistence failed; not recoverable here.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Unknown username or wrong password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The password hasher failed to produce a credential.
    #[error("credential hashing failed: {0}")]
    Hashing(String),
}

impl DirectoryError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }

    /// Conflicts are the only failure worth an automatic client retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DirectoryError::Conflict(_))
    }
}

/// Failure reported by a [`crate::DirectoryStore`] implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Optimistic concurrency check failed, or the row vanished mid-write.
    #[error("write conflict: {0}")]
    Conflict(String),

    /// A uniqueness constraint rejected the write.
    #[error("duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },

    /// Backend failure (connection, IO, poisoned lock, ...).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for DirectoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => DirectoryError::Conflict(msg),
            StoreError::Duplicate { field, value } => {
                DirectoryError::ValidationFailed(format!("{field} '{value}' is already in use"))
            }
            StoreError::Unavailable(msg) => DirectoryError::StoreUnavailable(msg),
        }
    }
}

impl From<DomainError> for DirectoryError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                DirectoryError::ValidationFailed(msg)
            }
            DomainError::Conflict(msg) => DirectoryError::Conflict(msg),
        }
    }
}

impl From<AuthzError> for DirectoryError {
    fn from(err: AuthzError) -> Self {
        DirectoryError::Forbidden(err.to_string())
    }
}

impl From<PasswordHashError> for DirectoryError {
    fn from(err: PasswordHashError) -> Self {
        DirectoryError::Hashing(err.to_string())
    }
}

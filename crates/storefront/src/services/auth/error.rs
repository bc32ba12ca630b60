//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password (deliberately indistinguishable).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The username is already registered.
    #[error("username already exists")]
    UserAlreadyExists,

    /// A required form field was blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Password hashing failed.
    #[error("failed to hash password")]
    PasswordHash,

    /// Database operation failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

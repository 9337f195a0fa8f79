//! Authentication error types.

use thiserror::Error;

use crate::db::StorageError;
use crate::services::auth::token::TokenError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid username format.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] minimart_core::UsernameError),

    /// Invalid credentials (wrong password or account not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Username already taken by another account of the same kind.
    #[error("username is already taken")]
    UsernameTaken,

    /// Empty password on signup or account creation.
    #[error("password cannot be empty")]
    EmptyPassword,

    /// Password hashing error. Fails the whole operation; credentials
    /// are never stored un-hashed.
    #[error("password hashing error")]
    PasswordHash,

    /// Token issuing error.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for AuthError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::DuplicateUsername(_) => Self::UsernameTaken,
            other => Self::Storage(other),
        }
    }
}

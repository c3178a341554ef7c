//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during token operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Freshly generated token collided with an existing digest.
    #[error("token collision, retry issuing")]
    TokenCollision,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

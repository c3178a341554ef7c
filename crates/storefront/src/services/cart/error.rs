//! Cart service error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Request input failed validation. The message is shown to the client.
    #[error("{0}")]
    Validation(String),

    /// Cart, item, or product does not exist. The message is shown to the client.
    #[error("{0}")]
    NotFound(String),

    /// Concurrent writers kept invalidating our read.
    #[error("cart is busy, gave up after {attempts} attempts")]
    Contention {
        /// Attempts made.
        attempts: u32,
    },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl CartError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

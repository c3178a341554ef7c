//! User and API token repository.
//!
//! Tokens are stored as SHA-256 digests (see [`crate::services::auth`]); this
//! module only ever sees the digest.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use wardrobe_core::{ApiTokenId, UserId};

use super::RepositoryError;
use crate::models::user::{ApiToken, User};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ApiTokenRow {
    id: ApiTokenId,
    user_id: UserId,
    label: Option<String>,
    created_at: DateTime<Utc>,
    last_used_at: Option<DateTime<Utc>>,
}

impl From<ApiTokenRow> for ApiToken {
    fn from(row: ApiTokenRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            label: row.label,
            created_at: row.created_at,
            last_used_at: row.last_used_at,
        }
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(
            r"
            SELECT id, name, created_at, updated_at
            FROM storefront.user
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, name: &str) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(
            r"
            INSERT INTO storefront.user (name)
            VALUES ($1)
            RETURNING id, name, created_at, updated_at
            ",
        )
        .bind(name)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Store a new token digest for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the digest already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert_token(
        &self,
        user_id: UserId,
        token_hash: &[u8],
        label: Option<&str>,
    ) -> Result<ApiToken, RepositoryError> {
        let row: ApiTokenRow = sqlx::query_as(
            r"
            INSERT INTO storefront.api_token (user_id, token_hash, label)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, label, created_at, last_used_at
            ",
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(label)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("token already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into())
    }

    /// Resolve a live (non-revoked) token digest to its user, stamping
    /// `last_used_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn touch_token(&self, token_hash: &[u8]) -> Result<Option<UserId>, RepositoryError> {
        let user_id: Option<UserId> = sqlx::query_scalar(
            r"
            UPDATE storefront.api_token
            SET last_used_at = now()
            WHERE token_hash = $1 AND revoked_at IS NULL
            RETURNING user_id
            ",
        )
        .bind(token_hash)
        .fetch_optional(self.pool)
        .await?;

        Ok(user_id)
    }

    /// Revoke every live token belonging to a user.
    ///
    /// Returns the number of tokens revoked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn revoke_tokens(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        if self.get_by_id(user_id).await?.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let result = sqlx::query(
            r"
            UPDATE storefront.api_token
            SET revoked_at = now()
            WHERE user_id = $1 AND revoked_at IS NULL
            ",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

//! Authentication service.
//!
//! Shoppers authenticate with opaque bearer tokens. A token is 32 random
//! bytes, URL-safe base64 encoded. Only `SHA-256(pepper || token)` is
//! stored, so a leaked database cannot be replayed without the pepper.

mod error;

pub use error::AuthError;

use std::collections::HashMap;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use wardrobe_core::UserId;

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::user::ApiToken;

/// Random bytes per token.
const TOKEN_BYTES: usize = 32;

/// Maps a presented bearer token to the user it identifies.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// `None` when the token is unknown or revoked.
    async fn resolve(&self, token: &str) -> Result<Option<UserId>, RepositoryError>;
}

/// Generate a new plaintext token.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest a token for storage or lookup.
#[must_use]
pub fn hash_token(pepper: &SecretString, token: &str) -> Vec<u8> {
    Sha256::new()
        .chain_update(pepper.expose_secret().as_bytes())
        .chain_update(token.as_bytes())
        .finalize()
        .to_vec()
}

/// Token issuing and resolution.
pub struct TokenService<'a> {
    users: UserRepository<'a>,
    pepper: &'a SecretString,
}

impl<'a> TokenService<'a> {
    /// Create a new token service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, pepper: &'a SecretString) -> Self {
        Self {
            users: UserRepository::new(pool),
            pepper,
        }
    }

    /// Issue a token for a user. The plaintext is returned once and never
    /// stored.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user does not exist.
    /// Returns `AuthError::TokenCollision` if the digest already exists.
    pub async fn issue(
        &self,
        user_id: UserId,
        label: Option<&str>,
    ) -> Result<(ApiToken, String), AuthError> {
        if self.users.get_by_id(user_id).await?.is_none() {
            return Err(AuthError::UserNotFound);
        }

        let token = generate_token();
        let record = self
            .users
            .insert_token(user_id, &hash_token(self.pepper, &token), label)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::TokenCollision,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user_id, token_id = %record.id, "issued api token");
        Ok((record, token))
    }

    /// Resolve a plaintext token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn resolve(&self, token: &str) -> Result<Option<UserId>, RepositoryError> {
        self.users
            .touch_token(&hash_token(self.pepper, token))
            .await
    }
}

/// Database-backed token resolution.
#[derive(Clone)]
pub struct PgIdentityResolver {
    pool: PgPool,
    pepper: SecretString,
}

impl PgIdentityResolver {
    /// Create a resolver.
    #[must_use]
    pub const fn new(pool: PgPool, pepper: SecretString) -> Self {
        Self { pool, pepper }
    }
}

#[async_trait]
impl IdentityResolver for PgIdentityResolver {
    async fn resolve(&self, token: &str) -> Result<Option<UserId>, RepositoryError> {
        TokenService::new(&self.pool, &self.pepper)
            .resolve(token)
            .await
    }
}

/// Fixed token table.
#[derive(Debug, Default, Clone)]
pub struct StaticIdentities {
    tokens: HashMap<String, UserId>,
}

impl StaticIdentities {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a token for `user_id`.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, user_id: UserId) -> Self {
        self.tokens.insert(token.into(), user_id);
        self
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentities {
    async fn resolve(&self, token: &str) -> Result<Option<UserId>, RepositoryError> {
        Ok(self.tokens.get(token).copied())
    }
}

//! Shopper and API token management commands.
//!
//! # Usage
//!
//! ```bash
//! wd-cli user create -n "Alice" -l laptop
//! wd-cli user issue-token -u 1 -l phone
//! wd-cli user revoke-tokens -u 1
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_TOKEN_PEPPER` - Must match the server's pepper or issued tokens will not resolve

use thiserror::Error;

use wardrobe_core::UserId;
use wardrobe_storefront::config::{ConfigError, load_token_pepper};
use wardrobe_storefront::db::{self, RepositoryError, UserRepository};
use wardrobe_storefront::services::auth::{AuthError, TokenService};

use super::{MissingDatabaseUrl, database_url};

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserCommandError {
    #[error(transparent)]
    MissingEnvVar(#[from] MissingDatabaseUrl),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("User name cannot be empty")]
    EmptyName,
}

/// Create a user and issue their first token.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns `UserCommandError` if configuration is missing or a database
/// operation fails.
pub async fn create(name: &str, label: Option<&str>) -> Result<UserId, UserCommandError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(UserCommandError::EmptyName);
    }

    let database_url = database_url()?;
    let pepper = load_token_pepper()?;

    tracing::info!("Connecting to storefront database...");
    let pool = db::create_pool(&database_url).await?;

    let user = UserRepository::new(&pool).create(name).await?;
    tracing::info!("User created successfully! ID: {}, Name: {}", user.id, user.name);

    let (_, token) = TokenService::new(&pool, &pepper)
        .issue(user.id, label)
        .await?;
    print_token(&token);

    Ok(user.id)
}

/// Issue an additional token for an existing user.
///
/// # Errors
///
/// Returns `UserCommandError` if the user does not exist or a database
/// operation fails.
pub async fn issue_token(user_id: i32, label: Option<&str>) -> Result<(), UserCommandError> {
    let database_url = database_url()?;
    let pepper = load_token_pepper()?;
    let pool = db::create_pool(&database_url).await?;

    let (record, token) = TokenService::new(&pool, &pepper)
        .issue(UserId::new(user_id), label)
        .await?;
    tracing::info!("Token {} issued for user {}", record.id, record.user_id);
    print_token(&token);

    Ok(())
}

/// Revoke every live token of a user.
///
/// # Errors
///
/// Returns `UserCommandError` if the user does not exist or a database
/// operation fails.
pub async fn revoke_tokens(user_id: i32) -> Result<(), UserCommandError> {
    let database_url = database_url()?;
    let pool = db::create_pool(&database_url).await?;

    let revoked = UserRepository::new(&pool)
        .revoke_tokens(UserId::new(user_id))
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => UserCommandError::Auth(AuthError::UserNotFound),
            other => UserCommandError::Repository(other),
        })?;
    tracing::info!("Revoked {} token(s) for user {}", revoked, user_id);

    Ok(())
}

/// The plaintext token is shown exactly once, on stdout, so it can be piped.
fn print_token(token: &str) {
    #[allow(clippy::print_stdout)]
    {
        println!("{token}");
    }
    tracing::warn!("Store this token now; it cannot be shown again.");
}

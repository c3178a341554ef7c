//! Database operations for storefront `PostgreSQL`.
//!
//! # Schema: `storefront`
//!
//! ## Tables
//!
//! - `user` - Shoppers
//! - `api_token` - Hashed bearer tokens identifying shoppers
//! - `product` - Catalog (read-only from the cart's point of view)
//! - `cart` - One row per user, with an optimistic-concurrency `version`
//! - `cart_item` - Line items, unique per `(cart_id, product_id, size)`
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p wardrobe-cli -- migrate
//! ```
//!
//! # Storage seams
//!
//! The cart service talks to storage through the [`CartStore`] and
//! [`ProductCatalog`] traits. `Pg*` types back them with `PostgreSQL`; the
//! [`memory`] module backs them with in-process maps for tests and local
//! experiments.

pub mod carts;
pub mod memory;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use carts::{CartStore, PgCartStore};
pub use memory::{InMemoryCartStore, InMemoryCatalog};
pub use products::{PgProductCatalog, ProductCatalog};
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored data failed domain validation.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Record not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation or stale optimistic-concurrency version.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A numeric value left its allowed range (e.g. a merged quantity).
    #[error("out of range: {0}")]
    OutOfRange(String),
}

/// Postgres SQLSTATE for `numeric_value_out_of_range`.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Map constraint failures to their domain-level variants.
pub(crate) fn map_write_error(e: sqlx::Error, conflict: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(conflict.to_owned());
        }
        if db_err.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) {
            return RepositoryError::OutOfRange(db_err.message().to_owned());
        }
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

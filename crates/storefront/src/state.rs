//! Application state shared across handlers.

use std::sync::Arc;

use secrecy::SecretString;
use sqlx::PgPool;

use crate::db::{CartStore, PgCartStore, PgProductCatalog, ProductCatalog};
use crate::services::auth::{IdentityResolver, PgIdentityResolver};
use crate::services::cart::CartService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// cart service and its collaborators.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    carts: CartService,
    catalog: Arc<dyn ProductCatalog>,
    identity: Arc<dyn IdentityResolver>,
    pool: Option<PgPool>,
}

impl AppState {
    /// State backed by `PostgreSQL`.
    ///
    /// # Arguments
    ///
    /// * `pool` - `PostgreSQL` connection pool
    /// * `token_pepper` - Secret mixed into API token digests
    #[must_use]
    pub fn new(pool: PgPool, token_pepper: SecretString) -> Self {
        let store: Arc<dyn CartStore> = Arc::new(PgCartStore::new(pool.clone()));
        let catalog: Arc<dyn ProductCatalog> = Arc::new(PgProductCatalog::new(pool.clone()));
        let identity = Arc::new(PgIdentityResolver::new(pool.clone(), token_pepper));

        Self::build(store, catalog, identity, Some(pool))
    }

    /// State over arbitrary collaborators, without a database pool.
    ///
    /// Readiness checks always pass for this state.
    #[must_use]
    pub fn from_parts(
        store: Arc<dyn CartStore>,
        catalog: Arc<dyn ProductCatalog>,
        identity: Arc<dyn IdentityResolver>,
    ) -> Self {
        Self::build(store, catalog, identity, None)
    }

    fn build(
        store: Arc<dyn CartStore>,
        catalog: Arc<dyn ProductCatalog>,
        identity: Arc<dyn IdentityResolver>,
        pool: Option<PgPool>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                carts: CartService::new(store, Arc::clone(&catalog)),
                catalog,
                identity,
                pool,
            }),
        }
    }

    /// Get a reference to the cart service.
    #[must_use]
    pub fn carts(&self) -> &CartService {
        &self.inner.carts
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &dyn ProductCatalog {
        self.inner.catalog.as_ref()
    }

    /// Get a reference to the bearer-token resolver.
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityResolver {
        self.inner.identity.as_ref()
    }

    /// Get the database connection pool, if this state has one.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }
}

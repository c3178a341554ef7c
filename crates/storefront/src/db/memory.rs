//! In-process storage.
//!
//! Mirrors the `PostgreSQL` semantics closely enough to exercise the cart
//! service without a database: one cart per user, atomic add-or-increment
//! that writes nothing on failure, and version-checked saves.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use wardrobe_core::{Cart, CartEntityError, CartId, LineItemData, Product, ProductId, UserId};

use super::{CartStore, ProductCatalog, RepositoryError};

#[derive(Default)]
struct Carts {
    last_id: i32,
    by_user: HashMap<UserId, Cart>,
}

/// Cart store backed by a mutex-guarded map.
#[derive(Default)]
pub struct InMemoryCartStore {
    carts: Mutex<Carts>,
}

impl InMemoryCartStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of carts held.
    pub async fn cart_count(&self) -> usize {
        self.carts.lock().await.by_user.len()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.carts.lock().await.by_user.get(&user_id).cloned())
    }

    async fn create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let mut carts = self.carts.lock().await;
        if carts.by_user.contains_key(&user_id) {
            return Err(RepositoryError::Conflict(
                "cart already exists for user".to_owned(),
            ));
        }
        carts.last_id += 1;
        let cart = Cart::new(CartId::new(carts.last_id), user_id);
        carts.by_user.insert(user_id, cart.clone());
        Ok(cart)
    }

    async fn add_or_increment(
        &self,
        user_id: UserId,
        item: LineItemData,
    ) -> Result<Cart, RepositoryError> {
        let mut carts = self.carts.lock().await;
        let mut cart = match carts.by_user.get(&user_id) {
            Some(cart) => cart.clone(),
            None => Cart::new(CartId::new(carts.last_id + 1), user_id),
        };

        cart.add_item(item).map_err(|e| match e {
            CartEntityError::Quantity(q) => RepositoryError::OutOfRange(q.to_string()),
            CartEntityError::ItemNotFound(_) => RepositoryError::NotFound,
        })?;
        cart.bump_version();

        if !carts.by_user.contains_key(&user_id) {
            carts.last_id += 1;
        }
        carts.by_user.insert(user_id, cart.clone());
        Ok(cart)
    }

    async fn save(&self, cart: &Cart) -> Result<Cart, RepositoryError> {
        let mut carts = self.carts.lock().await;
        let stored = carts
            .by_user
            .get_mut(&cart.user_id())
            .ok_or(RepositoryError::NotFound)?;
        if stored.version() != cart.version() {
            return Err(RepositoryError::Conflict(format!(
                "cart {} changed since version {}",
                cart.id(),
                cart.version()
            )));
        }
        let mut next = cart.clone();
        next.bump_version();
        *stored = next.clone();
        Ok(next)
    }
}

/// Catalog backed by a mutex-guarded map.
#[derive(Default)]
pub struct InMemoryCatalog {
    products: Mutex<HashMap<ProductId, Product>>,
}

impl InMemoryCatalog {
    /// A catalog holding `products`.
    #[must_use]
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            products: Mutex::new(products.into_iter().map(|p| (p.id, p)).collect()),
        }
    }

    /// Insert or replace a product.
    pub async fn upsert(&self, product: Product) {
        self.products.lock().await.insert(product.id, product);
    }

    /// Delete a product. Cart items referencing it are untouched.
    pub async fn remove(&self, id: ProductId) -> Option<Product> {
        self.products.lock().await.remove(&id)
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.products.lock().await.get(&id).cloned())
    }

    async fn find_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.lock().await;
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let mut all: Vec<Product> = self.products.lock().await.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(all)
    }
}

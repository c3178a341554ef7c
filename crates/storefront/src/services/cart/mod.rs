//! Cart service.
//!
//! Implements add/get/update/remove against a [`CartStore`] and a
//! [`ProductCatalog`]. Every operation takes the acting user's ID explicitly;
//! credential handling happens in the HTTP layer.
//!
//! # Concurrency
//!
//! - Adds go through [`CartStore::add_or_increment`], which creates the cart
//!   on first use and merges atomically. A failed add writes nothing.
//! - Updates and removals read the cart, mutate it, and save with a version
//!   check, retrying up to [`MAX_WRITE_ATTEMPTS`] times on conflict.

mod error;

pub use error::CartError;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::instrument;

use wardrobe_core::{
    Cart, CartEntityError, CartItemId, CartLineItem, LineItemData, Product, ProductId, Quantity,
    Size, UserId,
};

use crate::db::{CartStore, ProductCatalog, RepositoryError};

/// Attempts made by a version-checked write before giving up.
pub const MAX_WRITE_ATTEMPTS: u32 = 3;

const MISSING_ADD_FIELDS: &str = "Please provide product ID and size.";
const PRODUCT_NOT_FOUND: &str = "Product not found.";
const CART_NOT_FOUND: &str = "Cart not found.";
const ITEM_NOT_FOUND: &str = "Item not found in cart.";
const INVALID_QUANTITY: &str = "Quantity must be a positive whole number.";

/// Result of adding to cart.
#[derive(Debug, Clone)]
pub struct AddedToCart {
    /// Confirmation, e.g. `"Linen Shirt (M) added to cart!"`.
    pub message: String,
    /// The cart after the add.
    pub cart: Cart,
}

/// A line item with its product joined in at read time.
#[derive(Debug, Clone)]
pub struct CartEntry {
    /// The stored line item.
    pub item: CartLineItem,
    /// Current product, or `None` if it left the catalog.
    pub product: Option<Product>,
}

/// Read view of a cart.
#[derive(Debug, Clone, Default)]
pub struct CartContents {
    /// Items in insertion order.
    pub items: Vec<CartEntry>,
    /// Sum of item quantities.
    pub total_items: u64,
}

/// Cart operations.
#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn CartStore>,
    catalog: Arc<dyn ProductCatalog>,
}

impl CartService {
    /// Create a cart service.
    #[must_use]
    pub fn new(store: Arc<dyn CartStore>, catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { store, catalog }
    }

    /// Add `quantity` (default 1) of a product in a size to the user's cart,
    /// creating the cart on first use.
    ///
    /// # Errors
    ///
    /// - `CartError::Validation` for a missing or malformed product ID, a
    ///   missing or invalid size, a non-positive quantity, or a merged
    ///   quantity past the maximum.
    /// - `CartError::NotFound` if the product does not exist.
    /// - `CartError::Repository` on storage failure.
    #[instrument(skip(self, user_id), fields(user_id = %user_id))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: Option<&str>,
        size: Option<&str>,
        quantity: Option<i64>,
    ) -> Result<AddedToCart, CartError> {
        let (Some(product_id), Some(size)) = (non_blank(product_id), non_blank(size)) else {
            return Err(CartError::validation(MISSING_ADD_FIELDS));
        };
        let product_id =
            ProductId::parse(product_id).map_err(|e| CartError::validation(e.to_string()))?;
        let size = Size::parse(size).map_err(|e| CartError::validation(e.to_string()))?;
        let quantity = match quantity {
            Some(q) => {
                Quantity::try_from_i64(q).map_err(|_| CartError::validation(INVALID_QUANTITY))?
            }
            None => Quantity::ONE,
        };

        let product = self
            .catalog
            .find_product(product_id)
            .await?
            .ok_or_else(|| CartError::not_found(PRODUCT_NOT_FOUND))?;

        let data = LineItemData::snapshot(&product, size, quantity);
        let message = format!("{} ({}) added to cart!", product.name, data.size);

        let cart = self
            .store
            .add_or_increment(user_id, data)
            .await
            .map_err(|e| match e {
                RepositoryError::OutOfRange(_) => CartError::validation(format!(
                    "Quantity for this item cannot exceed {}.",
                    Quantity::MAX
                )),
                other => CartError::Repository(other),
            })?;

        tracing::info!(
            cart_id = %cart.id(),
            product_id = %product_id,
            quantity = quantity.get(),
            total_items = cart.total_items(),
            "added to cart"
        );

        Ok(AddedToCart { message, cart })
    }

    /// The user's cart with products joined in. Never creates a cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` on storage failure.
    #[instrument(skip(self, user_id), fields(user_id = %user_id))]
    pub async fn get_cart(&self, user_id: UserId) -> Result<CartContents, CartError> {
        match self.store.find_by_user(user_id).await? {
            Some(cart) => self.contents(cart).await,
            None => Ok(CartContents::default()),
        }
    }

    /// Set an item's quantity to exactly `quantity`.
    ///
    /// # Errors
    ///
    /// - `CartError::Validation` for a malformed item ID or a missing or
    ///   non-positive quantity.
    /// - `CartError::NotFound` if the user has no cart or the item is absent.
    /// - `CartError::Contention` if concurrent writers win every attempt.
    /// - `CartError::Repository` on storage failure.
    #[instrument(skip(self, user_id), fields(user_id = %user_id))]
    pub async fn update_item_quantity(
        &self,
        user_id: UserId,
        item_id: &str,
        quantity: Option<i64>,
    ) -> Result<CartContents, CartError> {
        let item_id = parse_item_id(item_id)?;
        let quantity = quantity
            .ok_or_else(|| CartError::validation(INVALID_QUANTITY))
            .and_then(|q| {
                Quantity::try_from_i64(q).map_err(|_| CartError::validation(INVALID_QUANTITY))
            })?;

        let cart = self
            .mutate(user_id, |cart| cart.set_quantity(item_id, quantity))
            .await?;

        tracing::info!(item_id = %item_id, quantity = quantity.get(), "updated cart item");
        self.contents(cart).await
    }

    /// Remove an item from the cart.
    ///
    /// # Errors
    ///
    /// - `CartError::Validation` for a malformed item ID.
    /// - `CartError::NotFound` if the user has no cart or the item is absent.
    /// - `CartError::Contention` if concurrent writers win every attempt.
    /// - `CartError::Repository` on storage failure.
    #[instrument(skip(self, user_id), fields(user_id = %user_id))]
    pub async fn remove_item(
        &self,
        user_id: UserId,
        item_id: &str,
    ) -> Result<CartContents, CartError> {
        let item_id = parse_item_id(item_id)?;

        let cart = self
            .mutate(user_id, |cart| cart.remove_item(item_id).map(|_| ()))
            .await?;

        tracing::info!(item_id = %item_id, "removed cart item");
        self.contents(cart).await
    }

    /// Read-modify-write with optimistic concurrency. `apply` runs against a
    /// fresh read on every attempt.
    async fn mutate<F>(&self, user_id: UserId, mut apply: F) -> Result<Cart, CartError>
    where
        F: FnMut(&mut Cart) -> Result<(), CartEntityError> + Send,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let mut cart = self
                .store
                .find_by_user(user_id)
                .await?
                .ok_or_else(|| CartError::not_found(CART_NOT_FOUND))?;

            apply(&mut cart).map_err(|e| match e {
                CartEntityError::ItemNotFound(_) => CartError::not_found(ITEM_NOT_FOUND),
                CartEntityError::Quantity(q) => CartError::validation(q.to_string()),
            })?;

            match self.store.save(&cart).await {
                Ok(saved) => return Ok(saved),
                Err(RepositoryError::Conflict(reason)) => {
                    tracing::warn!(attempt, %reason, "cart write conflict, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CartError::Contention {
            attempts: MAX_WRITE_ATTEMPTS,
        })
    }

    async fn contents(&self, cart: Cart) -> Result<CartContents, CartError> {
        let total_items = cart.total_items();
        let mut ids: Vec<ProductId> = cart.items().iter().map(CartLineItem::product_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let products: HashMap<ProductId, Product> = self
            .catalog
            .find_products(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let items = cart
            .items()
            .iter()
            .map(|item| CartEntry {
                product: products.get(&item.product_id()).cloned(),
                item: item.clone(),
            })
            .collect();

        Ok(CartContents { items, total_items })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_item_id(raw: &str) -> Result<CartItemId, CartError> {
    CartItemId::parse(raw).map_err(|e| CartError::validation(e.to_string()))
}

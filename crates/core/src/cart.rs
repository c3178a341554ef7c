//! The cart entity and its line-item rules.
//!
//! A [`Cart`] belongs to exactly one user and holds an ordered list of
//! [`CartLineItem`]s. The rules enforced here:
//!
//! - `(product_id, size)` is the identity key of a line item; adding the same
//!   key again merges into the existing item by summing quantities.
//! - Quantities are always at least 1 ([`Quantity`] cannot hold zero).
//! - `name` and `price` are snapshotted when the item is created and never
//!   change afterwards.
//! - Items keep insertion order.
//! - The total item count is derived on demand, never stored.
//!
//! The entity performs no I/O. Persistence is the job of a cart store, which
//! restores carts with [`Cart::restore`] and [`CartLineItem::restore`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::types::{
    CartId, CartItemId, Price, Product, ProductId, Quantity, QuantityError, Size, UserId,
};

/// Errors raised by cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartEntityError {
    /// No line item with this ID exists in the cart.
    #[error("cart item {0} not found")]
    ItemNotFound(CartItemId),

    /// Merging quantities would exceed the maximum.
    #[error(transparent)]
    Quantity(#[from] QuantityError),
}

/// The mutable-at-creation fields of a line item.
///
/// Built from a [`Product`] with [`LineItemData::snapshot`] when a shopper
/// adds to cart, or filled from storage when restoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItemData {
    /// Referenced product (weak reference).
    pub product_id: ProductId,
    /// Product name at add time.
    pub name: String,
    /// Size variant.
    pub size: Size,
    /// Unit price at add time.
    pub price: Price,
    /// Number of units.
    pub quantity: Quantity,
}

impl LineItemData {
    /// Snapshot a product's current name and price.
    #[must_use]
    pub fn snapshot(product: &Product, size: Size, quantity: Quantity) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            size,
            price: product.price,
            quantity,
        }
    }
}

/// One `(product, size, quantity, price)` entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    id: CartItemId,
    product_id: ProductId,
    name: String,
    size: Size,
    price: Price,
    quantity: Quantity,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CartLineItem {
    /// Create a brand-new line item with a fresh ID.
    #[must_use]
    pub fn create(data: LineItemData) -> Self {
        let now = Utc::now();
        Self::restore(CartItemId::generate(), data, now, now)
    }

    /// Rebuild a line item from stored fields.
    #[must_use]
    pub fn restore(
        id: CartItemId,
        data: LineItemData,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            product_id: data.product_id,
            name: data.name,
            size: data.size,
            price: data.price,
            quantity: data.quantity,
            created_at,
            updated_at,
        }
    }

    /// Line item ID.
    #[must_use]
    pub const fn id(&self) -> CartItemId {
        self.id
    }

    /// Referenced product ID.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Product name as of add time.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size variant.
    #[must_use]
    pub const fn size(&self) -> &Size {
        &self.size
    }

    /// Unit price as of add time.
    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    /// Current quantity.
    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// When the item was first added.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the quantity last changed.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn matches_key(&self, product_id: ProductId, size: &Size) -> bool {
        self.product_id == product_id && &self.size == size
    }

    fn set_quantity(&mut self, quantity: Quantity) {
        self.quantity = quantity;
        self.updated_at = Utc::now();
    }
}

/// A user's shopping cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    id: CartId,
    user_id: UserId,
    items: Vec<CartLineItem>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Cart {
    /// A new, empty cart at version 0.
    #[must_use]
    pub fn new(id: CartId, user_id: UserId) -> Self {
        let now = Utc::now();
        Self::restore(id, user_id, Vec::new(), 0, now, now)
    }

    /// Rebuild a cart from stored fields. `items` must already be in
    /// insertion order.
    #[must_use]
    pub const fn restore(
        id: CartId,
        user_id: UserId,
        items: Vec<CartLineItem>,
        version: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            items,
            version,
            created_at,
            updated_at,
        }
    }

    /// Cart ID.
    #[must_use]
    pub const fn id(&self) -> CartId {
        self.id
    }

    /// Owning user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Optimistic-concurrency version, incremented by every successful write.
    #[must_use]
    pub const fn version(&self) -> i64 {
        self.version
    }

    /// When the cart was created.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the cart was last written.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all line-item quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }

    /// Position of the item with this `(product_id, size)` key.
    #[must_use]
    pub fn find_index_by_key(&self, product_id: ProductId, size: &Size) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.matches_key(product_id, size))
    }

    /// Look up an item by its ID.
    #[must_use]
    pub fn find_by_id(&self, id: CartItemId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Add to cart with merge semantics, returning the affected item's ID.
    ///
    /// If an item with the same `(product_id, size)` exists its quantity is
    /// increased by `data.quantity` and its snapshot is left untouched.
    /// Otherwise `data` is appended as a new item.
    ///
    /// # Errors
    ///
    /// Returns [`CartEntityError::Quantity`] if the merged quantity would
    /// overflow. The cart is unchanged in that case.
    pub fn add_item(&mut self, data: LineItemData) -> Result<CartItemId, CartEntityError> {
        let existing = self
            .items
            .iter_mut()
            .find(|item| item.matches_key(data.product_id, &data.size));

        let id = if let Some(item) = existing {
            let merged = item.quantity.checked_add(data.quantity)?;
            item.set_quantity(merged);
            item.id
        } else {
            let item = CartLineItem::create(data);
            let id = item.id;
            self.items.push(item);
            id
        };

        self.updated_at = Utc::now();
        Ok(id)
    }

    /// Replace an item's quantity with `quantity`.
    ///
    /// # Errors
    ///
    /// Returns [`CartEntityError::ItemNotFound`] if no item has this ID.
    pub fn set_quantity(
        &mut self,
        id: CartItemId,
        quantity: Quantity,
    ) -> Result<(), CartEntityError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(CartEntityError::ItemNotFound(id))?;
        item.set_quantity(quantity);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Remove an item, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`CartEntityError::ItemNotFound`] if no item has this ID.
    pub fn remove_item(&mut self, id: CartItemId) -> Result<CartLineItem, CartEntityError> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(CartEntityError::ItemNotFound(id))?;
        self.updated_at = Utc::now();
        Ok(self.items.remove(index))
    }

    /// Record a successful write. Called by stores, not by business logic.
    pub fn bump_version(&mut self) {
        self.version += 1;
    }
}

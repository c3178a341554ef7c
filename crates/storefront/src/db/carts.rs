//! Cart persistence.
//!
//! Two write paths keep concurrent requests from losing updates:
//!
//! - [`CartStore::add_or_increment`] creates the cart if needed and upserts
//!   the item keyed by `(cart_id, product_id, size)` in one transaction, so
//!   two adds of the same key always sum and a failed add leaves nothing.
//! - [`CartStore::save`] writes a whole cart only if its `version` is still
//!   the one that was read; otherwise it returns [`RepositoryError::Conflict`]
//!   and the caller re-reads and retries.
//!
//! Both paths lock the `cart` row before touching `cart_item` rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use wardrobe_core::{
    Cart, CartId, CartItemId, CartLineItem, LineItemData, Price, ProductId, Quantity, Size, UserId,
};

use super::{RepositoryError, map_write_error};

/// Storage for carts and their line items.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// The user's cart with items in insertion order, if one exists.
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError>;

    /// Create an empty cart for a user.
    ///
    /// Returns [`RepositoryError::Conflict`] if the user already has one.
    async fn create(&self, user_id: UserId) -> Result<Cart, RepositoryError>;

    /// Atomically insert a line item into the user's cart, creating the cart
    /// if absent, or add its quantity to the existing item with the same
    /// `(product_id, size)`. The existing item's snapshot is kept. Returns the
    /// updated cart. On error nothing is written, including the cart.
    ///
    /// Returns [`RepositoryError::OutOfRange`] if the merged quantity
    /// overflows.
    async fn add_or_increment(
        &self,
        user_id: UserId,
        item: LineItemData,
    ) -> Result<Cart, RepositoryError>;

    /// Persist the cart's full item list if nobody else wrote it since it was
    /// read. Returns the stored cart with its new version.
    ///
    /// Returns [`RepositoryError::Conflict`] on a stale version.
    async fn save(&self, cart: &Cart) -> Result<Cart, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    product_id: ProductId,
    name: String,
    size: String,
    price: Decimal,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartItemRow> for CartLineItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        let size = Size::parse(&row.size).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid size in cart item {}: {e}", row.id))
        })?;
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price in cart item {}: {e}", row.id))
        })?;
        let quantity = Quantity::try_from(row.quantity).map_err(|e| {
            RepositoryError::DataCorruption(format!(
                "invalid quantity in cart item {}: {e}",
                row.id
            ))
        })?;

        Ok(Self::restore(
            row.id,
            LineItemData {
                product_id: row.product_id,
                name: row.name,
                size,
                price,
                quantity,
            },
            row.created_at,
            row.updated_at,
        ))
    }
}

impl CartRow {
    fn into_cart(self, items: Vec<CartLineItem>) -> Cart {
        Cart::restore(
            self.id,
            self.user_id,
            items,
            self.version,
            self.created_at,
            self.updated_at,
        )
    }
}

async fn fetch_items<'e, E: PgExecutor<'e>>(
    executor: E,
    cart_id: CartId,
) -> Result<Vec<CartLineItem>, RepositoryError> {
    let rows: Vec<CartItemRow> = sqlx::query_as(
        r"
        SELECT id, product_id, name, size, price, quantity, created_at, updated_at
        FROM storefront.cart_item
        WHERE cart_id = $1
        ORDER BY position
        ",
    )
    .bind(cart_id)
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(CartLineItem::try_from).collect()
}

/// `PostgreSQL` cart store.
#[derive(Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    /// Create a cart store over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let row: Option<CartRow> = sqlx::query_as(
            r"
            SELECT id, user_id, version, created_at, updated_at
            FROM storefront.cart
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let items = fetch_items(&self.pool, row.id).await?;
        Ok(Some(row.into_cart(items)))
    }

    async fn create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let row: CartRow = sqlx::query_as(
            r"
            INSERT INTO storefront.cart (user_id)
            VALUES ($1)
            RETURNING id, user_id, version, created_at, updated_at
            ",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "cart already exists for user"))?;

        Ok(row.into_cart(Vec::new()))
    }

    async fn add_or_increment(
        &self,
        user_id: UserId,
        item: LineItemData,
    ) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Takes the cart row lock before any item row, matching `save`.
        let row: CartRow = sqlx::query_as(
            r"
            INSERT INTO storefront.cart (user_id, version)
            VALUES ($1, 1)
            ON CONFLICT (user_id) DO UPDATE
            SET version = storefront.cart.version + 1, updated_at = now()
            RETURNING id, user_id, version, created_at, updated_at
            ",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r"
            INSERT INTO storefront.cart_item (id, cart_id, product_id, name, size, price, quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (cart_id, product_id, size) DO UPDATE
            SET quantity = storefront.cart_item.quantity + EXCLUDED.quantity,
                updated_at = now()
            ",
        )
        .bind(CartItemId::generate())
        .bind(row.id)
        .bind(item.product_id)
        .bind(&item.name)
        .bind(item.size.as_str())
        .bind(item.price.amount())
        .bind(item.quantity.as_i32())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "cart item key collision"))?;

        let items = fetch_items(&mut *tx, row.id).await?;
        tx.commit().await?;

        Ok(row.into_cart(items))
    }

    async fn save(&self, cart: &Cart) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<CartRow> = sqlx::query_as(
            r"
            UPDATE storefront.cart
            SET version = version + 1, updated_at = now()
            WHERE id = $1 AND version = $2
            RETURNING id, user_id, version, created_at, updated_at
            ",
        )
        .bind(cart.id())
        .bind(cart.version())
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Err(RepositoryError::Conflict(format!(
                "cart {} changed since version {}",
                cart.id(),
                cart.version()
            )));
        };

        let keep: Vec<Uuid> = cart.items().iter().map(|i| i.id().as_uuid()).collect();
        sqlx::query(
            r"
            DELETE FROM storefront.cart_item
            WHERE cart_id = $1 AND NOT (id = ANY($2))
            ",
        )
        .bind(cart.id())
        .bind(&keep)
        .execute(&mut *tx)
        .await?;

        for item in cart.items() {
            sqlx::query(
                r"
                INSERT INTO storefront.cart_item
                    (id, cart_id, product_id, name, size, price, quantity, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (id) DO UPDATE
                SET quantity = EXCLUDED.quantity,
                    updated_at = EXCLUDED.updated_at
                ",
            )
            .bind(item.id())
            .bind(cart.id())
            .bind(item.product_id())
            .bind(item.name())
            .bind(item.size().as_str())
            .bind(item.price().amount())
            .bind(item.quantity().as_i32())
            .bind(item.created_at())
            .bind(item.updated_at())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, "cart item key collision"))?;
        }

        let items = fetch_items(&mut *tx, cart.id()).await?;
        tx.commit().await?;

        Ok(row.into_cart(items))
    }
}

//! Catalog product as seen by the cart.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// A product in the catalog.
///
/// The cart only reads products: it snapshots `name` and `price` into a line
/// item when the product is first added and looks products up again when a
/// cart is displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Current unit price.
    pub price: Price,
    /// Units in stock. Informational only; the cart never checks it.
    pub stock: i32,
}

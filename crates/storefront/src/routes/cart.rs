//! Cart route handlers.
//!
//! JSON API over [`CartService`](crate::services::cart::CartService). All
//! handlers require a bearer token via [`RequireUser`].

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use wardrobe_core::{Cart, CartId, CartLineItem, Product, UserId};

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireUser;
use crate::services::cart::{CartContents, CartEntry};
use crate::state::AppState;

// =============================================================================
// Request Bodies
// =============================================================================

/// Body of `POST /cart`.
///
/// Fields are optional so that missing values produce a domain validation
/// message instead of a deserialization error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartBody {
    pub product_id: Option<String>,
    pub size: Option<String>,
    pub quantity: Option<i64>,
}

/// Body of `PUT /cart/{item_id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityBody {
    pub quantity: Option<i64>,
}

// =============================================================================
// Response Views
// =============================================================================

/// Full cart as returned by `POST /cart`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartLineItem>,
    pub total_items: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        Self {
            id: cart.id(),
            user_id: cart.user_id(),
            total_items: cart.total_items(),
            items: cart.items().to_vec(),
            created_at: cart.created_at(),
            updated_at: cart.updated_at(),
        }
    }
}

/// A line item with its current product, or `null` if the product is gone.
#[derive(Debug, Serialize)]
pub struct CartItemView {
    #[serde(flatten)]
    pub item: CartLineItem,
    pub product: Option<Product>,
}

impl From<CartEntry> for CartItemView {
    fn from(entry: CartEntry) -> Self {
        Self {
            item: entry.item,
            product: entry.product,
        }
    }
}

/// `{items, totalItems}` view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartContentsView {
    pub items: Vec<CartItemView>,
    pub total_items: u64,
}

impl From<CartContents> for CartContentsView {
    fn from(contents: CartContents) -> Self {
        Self {
            items: contents.items.into_iter().map(CartItemView::from).collect(),
            total_items: contents.total_items,
        }
    }
}

/// Response of `POST /cart`.
#[derive(Debug, Serialize)]
pub struct AddToCartResponse {
    pub message: String,
    pub cart: CartView,
}

/// Response of `PUT`/`DELETE /cart/{item_id}`.
#[derive(Debug, Serialize)]
pub struct CartChangedResponse {
    pub message: &'static str,
    #[serde(flatten)]
    pub contents: CartContentsView,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Show the current user's cart.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<CartContentsView>> {
    let contents = state.carts().get_cart(user.id).await?;
    Ok(Json(contents.into()))
}

/// Add to cart.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    body: std::result::Result<Json<AddToCartBody>, JsonRejection>,
) -> Result<(StatusCode, Json<AddToCartResponse>)> {
    let Json(body) = body?;

    let added = state
        .carts()
        .add_item(
            user.id,
            body.product_id.as_deref(),
            body.size.as_deref(),
            body.quantity,
        )
        .await?;

    add_breadcrumb("cart", &added.message, None);

    Ok((
        StatusCode::CREATED,
        Json(AddToCartResponse {
            message: added.message,
            cart: added.cart.into(),
        }),
    ))
}

/// Set a line item's quantity.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(item_id): Path<String>,
    body: std::result::Result<Json<UpdateQuantityBody>, JsonRejection>,
) -> Result<Json<CartChangedResponse>> {
    let Json(body) = body?;

    let contents = state
        .carts()
        .update_item_quantity(user.id, &item_id, body.quantity)
        .await?;

    Ok(Json(CartChangedResponse {
        message: "Cart item updated",
        contents: contents.into(),
    }))
}

/// Remove a line item.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(item_id): Path<String>,
) -> Result<Json<CartChangedResponse>> {
    let contents = state.carts().remove_item(user.id, &item_id).await?;

    add_breadcrumb("cart", "Removed cart item", Some(&[("item_id", &item_id)]));

    Ok(Json(CartChangedResponse {
        message: "Item removed from cart",
        contents: contents.into(),
    }))
}

//! Product route handlers.
//!
//! Read-only catalog browsing. No authentication required.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use wardrobe_core::{Product, ProductId};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// List all products, ordered by name.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = state.catalog().list_products().await?;
    Ok(Json(products))
}

/// Show a single product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let id = ProductId::parse(&id).map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .catalog()
        .find_product(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found.".to_string()))
}

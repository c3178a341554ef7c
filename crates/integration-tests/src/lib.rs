//! Integration tests for Wardrobe.
//!
//! Tests drive the storefront router in-process with
//! `tower::ServiceExt::oneshot`, wired to in-memory stores. No database or
//! network is needed except for `pg_store`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p wardrobe-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_api` - Cart endpoints, status codes and response shapes
//! - `cart_concurrency` - Concurrent writers against one cart
//! - `products_api` - Catalog browsing and health checks
//! - `pg_store` - Stores and services against `PostgreSQL` (ignored unless
//!   run with `--ignored` and a `DATABASE_URL`)

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use wardrobe_core::{Price, Product, ProductId, UserId};
use wardrobe_storefront::db::{InMemoryCartStore, InMemoryCatalog};
use wardrobe_storefront::services::auth::StaticIdentities;
use wardrobe_storefront::{AppState, app};

/// Token that resolves to [`ALICE`].
pub const ALICE_TOKEN: &str = "alice-test-token";
/// Token that resolves to [`BOB`].
pub const BOB_TOKEN: &str = "bob-test-token";
/// First test shopper.
pub const ALICE: UserId = UserId::new(1);
/// Second test shopper.
pub const BOB: UserId = UserId::new(2);

/// A running in-process storefront with handles to its in-memory stores.
pub struct TestApp {
    pub router: Router,
    pub carts: Arc<InMemoryCartStore>,
    pub catalog: Arc<InMemoryCatalog>,
}

/// A decoded response.
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// A catalog product priced in cents.
#[must_use]
pub fn product(name: &str, cents: i64) -> Product {
    Product {
        id: ProductId::generate(),
        name: name.to_owned(),
        price: Price::from_cents(cents).unwrap(),
        stock: 10,
    }
}

impl TestApp {
    /// Build the app over a catalog holding `products`.
    #[must_use]
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let carts = Arc::new(InMemoryCartStore::new());
        let catalog = Arc::new(InMemoryCatalog::with_products(products));
        let identities = StaticIdentities::new()
            .with_token(ALICE_TOKEN, ALICE)
            .with_token(BOB_TOKEN, BOB);

        let state = AppState::from_parts(carts.clone(), catalog.clone(), Arc::new(identities));

        Self {
            router: app(state),
            carts,
            catalog,
        }
    }

    /// Send a request. `token` becomes a bearer credential; `body` is sent
    /// as JSON.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send(request).await
    }

    /// Send a prepared request.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse { status, body }
    }

    /// `POST /cart` as `token`.
    pub async fn add(&self, token: &str, body: Value) -> TestResponse {
        self.request(Method::POST, "/cart", Some(token), Some(body))
            .await
    }

    /// `GET /cart` as `token`.
    pub async fn get_cart(&self, token: &str) -> TestResponse {
        self.request(Method::GET, "/cart", Some(token), None).await
    }

    /// `PUT /cart/{item_id}` as `token`.
    pub async fn update(&self, token: &str, item_id: &str, body: Value) -> TestResponse {
        self.request(
            Method::PUT,
            &format!("/cart/{item_id}"),
            Some(token),
            Some(body),
        )
        .await
    }

    /// `DELETE /cart/{item_id}` as `token`.
    pub async fn remove(&self, token: &str, item_id: &str) -> TestResponse {
        self.request(Method::DELETE, &format!("/cart/{item_id}"), Some(token), None)
            .await
    }
}

/// Find the item with `product_id` and `size` in an `items` array.
#[must_use]
pub fn find_item<'a>(items: &'a Value, product_id: ProductId, size: &str) -> Option<&'a Value> {
    let product_id = product_id.to_string();
    items.as_array()?.iter().find(|item| {
        item["productId"].as_str() == Some(product_id.as_str()) && item["size"] == size
    })
}

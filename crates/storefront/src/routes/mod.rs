//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health               - Liveness check
//! GET    /health/ready         - Readiness check (database)
//!
//! # Products
//! GET    /products             - Product listing
//! GET    /products/{id}        - Product detail
//!
//! # Cart (requires bearer token)
//! GET    /cart                 - Items with products joined, plus totalItems
//! POST   /cart                 - Add to cart (merges same product + size)
//! PUT    /cart/{item_id}       - Set item quantity
//! DELETE /cart/{item_id}       - Remove item
//! ```
//!
//! Product and cart routes are also served under `/api`.

pub mod cart;
pub mod health;
pub mod products;

use axum::{
    Router,
    http::{Request, Response},
    middleware::from_fn,
    routing::{get, put},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add))
        .route("/{item_id}", put(cart::update).delete(cart::remove))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the API router (cart and products).
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/cart", cart_routes())
        .nest("/products", product_routes());

    Router::new().merge(api.clone()).nest("/api", api)
}

/// Build the full application: API routes, health checks, request IDs and
/// request tracing. Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(routes())
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<_>, latency: std::time::Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, added in `main`)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//!
//! Authentication is per-handler through the [`RequireUser`] extractor.

pub mod auth;
pub mod request_id;

pub use auth::{CurrentUser, RequireUser};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};

//! Domain models for storefront.
//!
//! Cart and catalog types live in `wardrobe-core`; this module holds the
//! storefront-only account types.

pub mod user;

pub use user::{ApiToken, User};

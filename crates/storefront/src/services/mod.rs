//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - API token issuing, revocation and resolution
//! - `cart` - Per-user cart operations

pub mod auth;
pub mod cart;

pub use auth::{AuthError, IdentityResolver, PgIdentityResolver, StaticIdentities, TokenService};
pub use cart::{AddedToCart, CartContents, CartEntry, CartError, CartService};

//! Wardrobe Core - Shared domain types.
//!
//! This crate provides the types shared by every Wardrobe component:
//! - `storefront` - HTTP backend for catalog browsing and the shopping cart
//! - `cli` - Command-line tools for migrations, users and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure domain logic - no I/O, no
//! database access, no HTTP. The optional `postgres` feature adds `sqlx`
//! encode/decode implementations for the ID newtypes.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, quantities, sizes and products
//! - [`cart`] - The cart entity with its merge and quantity rules

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, CartEntityError, CartLineItem, LineItemData};
pub use types::*;

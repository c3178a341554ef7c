//! Wardrobe Storefront library.
//!
//! Per-user shopping carts and catalog browsing over a JSON API. The binary
//! in `main.rs` wires this library to `PostgreSQL`; the integration tests
//! wire it to in-memory collaborators.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use routes::app;
pub use state::AppState;

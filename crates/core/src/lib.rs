//! Wallposter Core - storefront domain library.
//!
//! This crate holds the poster shop's domain logic, shared by:
//! - `storefront` - Public-facing shop (catalog, cart, checkout, order API)
//! - `cli` - Command-line tools for migrations, catalog checks and orders
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Everything here can be tested without
//! a runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product/order IDs and prices
//! - [`catalog`] - Product records, validation and facets
//! - [`browse`] - Search, filter and sort over the catalog
//! - [`cart`] - Cart lines, totals and persisted snapshots
//! - [`checkout`] - Checkout summary and submission state
//! - [`order`] - Order wire types and server-side pricing

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod browse;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod order;
pub mod types;

pub use catalog::{Catalog, CatalogError, Product, Variant};
pub use types::*;

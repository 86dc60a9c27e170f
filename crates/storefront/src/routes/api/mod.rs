//! JSON API.
//!
//! - `products` - Catalog queries (same parameters as the catalog page)
//! - `orders` - Order Service (`POST /api/order`)

pub mod orders;
pub mod products;

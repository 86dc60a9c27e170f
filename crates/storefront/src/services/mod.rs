//! Business logic services for storefront.
//!
//! # Services
//!
//! - `catalog` - Catalog loading from a file or URL
//! - `orders` - Order Service (pricing, idempotency, persistence)
//! - `submit` - Checkout-side order submission (local or remote)

pub mod catalog;
pub mod orders;
pub mod submit;

pub use orders::{OrderService, OrderServiceError, OrderStore};
pub use submit::{OrderClient, OrderClientError, OrderSubmitter};

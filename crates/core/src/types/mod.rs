//! Core value types for the storefront.

pub mod id;
pub mod price;

pub use id::{OrderId, ProductId};
pub use price::{CurrencyCode, Price};

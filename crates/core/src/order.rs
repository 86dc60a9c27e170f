//! Order wire types and server-side pricing.
//!
//! The client sends shipping details plus `{title, size, qty}` items. No
//! prices travel with the order, so the server prices every item against
//! its own catalog before storing it ([`price_items`]). Items that cannot be
//! matched are kept with no price and counted as unpriced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::types::{OrderId, Price, ProductId};

/// HTTP header carrying the client-chosen idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Message returned alongside a new order id.
pub const ORDER_SAVED_MESSAGE: &str = "Order saved successfully";

/// Error message returned when an order cannot be persisted.
pub const ORDER_SAVE_FAILED_MESSAGE: &str = "Failed to save order";

/// Shipping address fields. Free text, not validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingDetails {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub country: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal: String,
}

/// One requested order item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrderItem {
    pub title: String,
    pub size: String,
    pub qty: u32,
    /// Catalog id, when the client knows it. Used only for pricing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
}

/// Body of an order-creation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderRequest {
    pub shipping: ShippingDetails,
    pub items: Vec<OrderItem>,
}

/// Success response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    #[serde(default)]
    pub message: String,
    pub order_id: OrderId,
}

impl OrderCreated {
    #[must_use]
    pub fn new(order_id: OrderId) -> Self {
        Self {
            message: ORDER_SAVED_MESSAGE.to_string(),
            order_id,
        }
    }
}

/// Failure response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Errors building an [`Order`] from a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Quantities are too large for the subtotal to be represented.
    #[error("order total is too large")]
    TotalOverflow,
}

/// Errors that can occur when parsing an [`IdempotencyKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdempotencyKeyError {
    #[error("idempotency key cannot be empty")]
    Empty,
    #[error("idempotency key must be at most {max} characters")]
    TooLong { max: usize },
    #[error("idempotency key must be visible ASCII")]
    InvalidCharacter,
}

/// A client-chosen key that makes order creation safe to retry.
///
/// ## Constraints
///
/// - Length: 1-128 characters
/// - Visible ASCII only (no spaces or control characters)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub const MAX_LENGTH: usize = 128;

    /// Parse an idempotency key.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, or contains
    /// characters outside visible ASCII.
    pub fn parse(s: &str) -> Result<Self, IdempotencyKeyError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdempotencyKeyError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(IdempotencyKeyError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !s.chars().all(|c| c.is_ascii_graphic()) {
            return Err(IdempotencyKeyError::InvalidCharacter);
        }
        Ok(Self(s.to_owned()))
    }

    /// Generate a random key for a freshly rendered checkout form.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An order item with the unit price the server found for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedItem {
    pub title: String,
    pub size: String,
    pub qty: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    /// Catalog unit price, or `None` if the item matched nothing.
    #[serde(default)]
    pub unit_price: Option<Price>,
}

impl PricedItem {
    /// Unit price times quantity; saturates on overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<Price> {
        self.unit_price.map(|price| price.times(self.qty))
    }
}

/// Exact sum of the priced line totals, or `None` if it overflows.
fn checked_subtotal(items: &[PricedItem]) -> Option<Price> {
    items.iter().try_fold(Price::ZERO, |sum, item| match item.unit_price {
        Some(price) => sum.checked_add(price.checked_times(item.qty)?),
        None => Some(sum),
    })
}

/// Price requested items against the catalog.
///
/// Items are matched by `productId` and size when the id is present,
/// otherwise by exact title and size.
#[must_use]
pub fn price_items(items: &[OrderItem], catalog: &Catalog) -> Vec<PricedItem> {
    items
        .iter()
        .map(|item| {
            let product = item
                .product_id
                .map_or_else(|| catalog.find_by_title(&item.title), |id| catalog.get(id));
            let variant = product.and_then(|p| p.variant(&item.size));

            PricedItem {
                title: item.title.clone(),
                size: item.size.clone(),
                qty: item.qty,
                product_id: product.map(|p| p.id).or(item.product_id),
                unit_price: variant.map(|v| v.price),
            }
        })
        .collect()
}

/// A stored order. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub shipping: ShippingDetails,
    pub items: Vec<PricedItem>,
    /// Sum of the priced items; unpriced items contribute nothing.
    pub subtotal: Price,
    pub idempotency_key: Option<IdempotencyKey>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Build a new order from a request, pricing it against the catalog.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::TotalOverflow` if the quantities push the
    /// subtotal past what a [`Price`] can hold.
    pub fn create(
        request: OrderRequest,
        catalog: &Catalog,
        idempotency_key: Option<IdempotencyKey>,
    ) -> Result<Self, OrderError> {
        let items = price_items(&request.items, catalog);
        let subtotal = checked_subtotal(&items).ok_or(OrderError::TotalOverflow)?;

        Ok(Self {
            id: OrderId::generate(),
            shipping: request.shipping,
            items,
            subtotal,
            idempotency_key,
            created_at: Utc::now(),
        })
    }

    /// Number of items the catalog could not price.
    #[must_use]
    pub fn unpriced_items(&self) -> usize {
        self.items.iter().filter(|i| i.unit_price.is_none()).count()
    }
}

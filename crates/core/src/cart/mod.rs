//! Cart Engine.
//!
//! The cart maps a composite [`LineKey`] (product id + variant size) to a
//! [`CartLine`]. There is at most one line per key, quantities never drop
//! below 1 except by explicit removal, and the unit price is snapshotted
//! when the line is first added.
//!
//! Persistence of the line list lives in [`snapshot`].

pub mod snapshot;

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::catalog::{Product, Variant};
use crate::types::{Price, ProductId};

/// Errors raised by cart operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The product has no variant in the requested size.
    #[error("size {size} is not available for product {product}")]
    UnknownVariant {
        /// Product the caller tried to add.
        product: ProductId,
        /// Requested size.
        size: String,
    },

    /// No line exists for the key.
    #[error("no cart line for {0}")]
    LineNotFound(LineKey),
}

/// Error parsing a [`LineKey`] from its textual form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed cart line key '{0}'")]
pub struct LineKeyError(String);

/// Composite cart key: product id plus variant size.
///
/// The textual form is `"<productId>:<size>"`, e.g. `"1:A3"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LineKey {
    product_id: ProductId,
    size: String,
}

impl LineKey {
    #[must_use]
    pub fn new(product_id: ProductId, size: impl Into<String>) -> Self {
        Self {
            product_id,
            size: size.into(),
        }
    }

    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Stand-in for a stored key that could not be read.
    fn placeholder() -> Self {
        Self::new(ProductId::new(0), "")
    }

    #[must_use]
    pub fn size(&self) -> &str {
        &self.size
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.product_id, self.size)
    }
}

impl FromStr for LineKey {
    type Err = LineKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, size) = s.split_once(':').ok_or_else(|| LineKeyError(s.to_string()))?;
        let product_id = id.parse().map_err(|_| LineKeyError(s.to_string()))?;
        if size.is_empty() {
            return Err(LineKeyError(s.to_string()));
        }
        Ok(Self::new(product_id, size))
    }
}

impl TryFrom<String> for LineKey {
    type Error = LineKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LineKey> for String {
    fn from(key: LineKey) -> Self {
        key.to_string()
    }
}

fn lenient_key<'de, D: Deserializer<'de>>(deserializer: D) -> Result<LineKey, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(raw
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(LineKey::placeholder))
}

/// One row of the cart.
///
/// Serialized with the short field names used by the stored cart:
/// `key`, `id`, `title`, `thumb`, `variant`, `price`, `qty`.
///
/// The stored `key` is advisory: [`Cart::from_lines`] re-derives it from `id`
/// and the variant size, so an unreadable key does not fail the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(default = "LineKey::placeholder", deserialize_with = "lenient_key")]
    pub key: LineKey,
    #[serde(rename = "id")]
    pub product_id: ProductId,
    pub title: String,
    #[serde(rename = "thumb", default)]
    pub thumbnail: String,
    pub variant: Variant,
    /// Unit price at the time the line was added.
    #[serde(rename = "price")]
    pub unit_price: Price,
    #[serde(rename = "qty")]
    pub quantity: u32,
}

impl CartLine {
    fn new(product: &Product, variant: &Variant) -> Self {
        Self {
            key: LineKey::new(product.id, variant.size.clone()),
            product_id: product.id,
            title: product.title.clone(),
            thumbnail: product.thumbnail().to_string(),
            variant: variant.clone(),
            unit_price: variant.price,
            quantity: 1,
        }
    }

    /// Unit price times quantity, saturating on overflow.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Cart totals. No tax or discount applies at the cart stage, so the grand
/// total equals the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CartTotals {
    pub subtotal: Price,
    pub grand_total: Price,
    pub item_count: u32,
}

/// The shopping cart: an insertion-ordered list of unique lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Rebuild a cart from stored lines, restoring the line invariants.
    ///
    /// Keys are re-derived from product id and variant size, lines sharing
    /// a key are merged by summing quantities, and zero quantities are
    /// raised to 1.
    #[must_use]
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut cart = Self::new();
        for mut line in lines {
            line.key = LineKey::new(line.product_id, line.variant.size.clone());
            line.quantity = line.quantity.max(1);
            match cart.line_mut(&line.key) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                }
                None => cart.lines.push(line),
            }
        }
        cart
    }

    fn line_mut(&mut self, key: &LineKey) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| &line.key == key)
    }

    fn require_line(&mut self, key: &LineKey) -> Result<&mut CartLine, CartError> {
        self.line_mut(key)
            .ok_or_else(|| CartError::LineNotFound(key.clone()))
    }

    /// Add one unit of a product variant.
    ///
    /// Increments the existing line for the same key, or inserts a new line
    /// with quantity 1 and the variant's current price. Returns the line's
    /// new quantity.
    ///
    /// # Errors
    ///
    /// Returns `CartError::UnknownVariant` if the product has no variant in
    /// `size`; the cart is left unchanged.
    pub fn add(&mut self, product: &Product, size: &str) -> Result<u32, CartError> {
        let variant = product
            .variant(size)
            .ok_or_else(|| CartError::UnknownVariant {
                product: product.id,
                size: size.to_string(),
            })?;

        let key = LineKey::new(product.id, size);
        if let Some(line) = self.line_mut(&key) {
            line.quantity = line.quantity.saturating_add(1);
            return Ok(line.quantity);
        }

        self.lines.push(CartLine::new(product, variant));
        Ok(1)
    }

    /// Add one unit to an existing line. Returns the new quantity.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if no line has this key.
    pub fn increment(&mut self, key: &LineKey) -> Result<u32, CartError> {
        let line = self.require_line(key)?;
        line.quantity = line.quantity.saturating_add(1);
        Ok(line.quantity)
    }

    /// Remove one unit from a line, never going below 1.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if no line has this key.
    pub fn decrement(&mut self, key: &LineKey) -> Result<u32, CartError> {
        let line = self.require_line(key)?;
        line.quantity = line.quantity.saturating_sub(1).max(1);
        Ok(line.quantity)
    }

    /// Delete a line regardless of its quantity.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if no line has this key.
    pub fn remove(&mut self, key: &LineKey) -> Result<CartLine, CartError> {
        let index = self
            .lines
            .iter()
            .position(|line| &line.key == key)
            .ok_or_else(|| CartError::LineNotFound(key.clone()))?;
        Ok(self.lines.remove(index))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn get(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.key == key)
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines (the cart badge).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |count, line| count.saturating_add(line.quantity))
    }

    /// Sum of unit price times quantity over all lines. Saturates rather
    /// than overflowing; orders are re-priced exactly on the server.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    #[must_use]
    pub fn totals(&self) -> CartTotals {
        let subtotal = self.subtotal();
        CartTotals {
            subtotal,
            grand_total: subtotal,
            item_count: self.item_count(),
        }
    }
}

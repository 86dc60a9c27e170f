//! Catalog Store: the product list loaded once at startup.
//!
//! Products are immutable after load. The catalog document is a JSON array
//! of camelCase product objects:
//!
//! ```json
//! [{
//!   "id": 1,
//!   "title": "Monsoon Over Kochi",
//!   "artist": "R. Menon",
//!   "category": "Landscape",
//!   "orientation": "Portrait",
//!   "basePrice": 49900,
//!   "popularity": 87,
//!   "addedAt": "2024-06-01",
//!   "tags": ["rain", "kerala"],
//!   "images": [{ "src": "/static/img/monsoon.jpg", "alt": "Rain over backwaters" }],
//!   "variants": [{ "size": "A3", "price": 49900 }, { "size": "A2", "price": 79900 }]
//! }]
//! ```

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::types::{Price, ProductId};

/// Errors raised while loading a catalog document.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The document is not valid JSON or does not match the product schema.
    #[error("malformed catalog document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Two products share the same id.
    #[error("duplicate product id {0}")]
    DuplicateProduct(ProductId),

    /// A product has no purchasable variants.
    #[error("product {0} has no variants")]
    NoVariants(ProductId),

    /// A product lists the same size twice.
    #[error("product {product} lists size {size} more than once")]
    DuplicateVariant {
        /// Offending product.
        product: ProductId,
        /// Repeated size.
        size: String,
    },

    /// A base or variant price is zero or negative.
    #[error("product {0} has a non-positive price")]
    InvalidPrice(ProductId),
}

/// A product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub src: String,
    #[serde(default)]
    pub alt: String,
}

/// A purchasable size/price option of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub size: String,
    pub price: Price,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub orientation: String,
    pub base_price: Price,
    #[serde(default)]
    pub popularity: u32,
    #[serde(deserialize_with = "deserialize_added_at")]
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    pub variants: Vec<Variant>,
}

impl Product {
    /// The first image, used for cards and cart thumbnails.
    #[must_use]
    pub fn primary_image(&self) -> Option<&Image> {
        self.images.first()
    }

    /// Source of the primary image, or an empty string when there is none.
    #[must_use]
    pub fn thumbnail(&self) -> &str {
        self.primary_image().map_or("", |image| image.src.as_str())
    }

    /// Look up the variant for a size.
    #[must_use]
    pub fn variant(&self, size: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.size == size)
    }

    /// Whether any variant is offered in one of the given sizes.
    #[must_use]
    pub fn offers_any_size(&self, sizes: &BTreeSet<String>) -> bool {
        self.variants.iter().any(|v| sizes.contains(&v.size))
    }

    /// Lowercased title, artist, description and tags joined by spaces.
    #[must_use]
    pub fn search_text(&self) -> String {
        let mut parts = vec![
            self.title.as_str(),
            self.artist.as_str(),
            self.description.as_str(),
        ];
        parts.extend(self.tags.iter().map(String::as_str));
        parts.join(" ").to_lowercase()
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.variants.is_empty() {
            return Err(CatalogError::NoVariants(self.id));
        }
        if !self.base_price.is_positive() || self.variants.iter().any(|v| !v.price.is_positive())
        {
            return Err(CatalogError::InvalidPrice(self.id));
        }

        let mut sizes = HashSet::new();
        for variant in &self.variants {
            if !sizes.insert(variant.size.as_str()) {
                return Err(CatalogError::DuplicateVariant {
                    product: self.id,
                    size: variant.size.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Accept either an RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
fn deserialize_added_at<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_added_at(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid addedAt value '{raw}'"))
    })
}

fn parse_added_at(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// Distinct filter values present in the catalog, each sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Facets {
    pub categories: Vec<String>,
    pub orientations: Vec<String>,
    pub sizes: Vec<String>,
}

/// The full product list.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Build a catalog from already-parsed products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if a product id repeats or a product breaks a
    /// variant or price invariant.
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut ids = HashSet::new();
        for product in &products {
            if !ids.insert(product.id) {
                return Err(CatalogError::DuplicateProduct(product.id));
            }
            product.validate()?;
        }
        Ok(Self { products })
    }

    /// Parse and validate a catalog document.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Malformed` for invalid JSON, or a validation
    /// error as in [`Catalog::new`].
    pub fn from_json(document: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(document)?;
        Self::new(products)
    }

    /// A catalog with no products.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            products: Vec::new(),
        }
    }

    /// All products in document order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Find a product by id.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Find a product by exact title.
    #[must_use]
    pub fn find_by_title(&self, title: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.title == title)
    }

    /// Distinct categories, orientations and sizes for the filter chips.
    #[must_use]
    pub fn facets(&self) -> Facets {
        let categories: BTreeSet<&str> =
            self.products.iter().map(|p| p.category.as_str()).collect();
        let orientations: BTreeSet<&str> =
            self.products.iter().map(|p| p.orientation.as_str()).collect();
        let sizes: BTreeSet<&str> = self
            .products
            .iter()
            .flat_map(|p| p.variants.iter().map(|v| v.size.as_str()))
            .collect();

        Facets {
            categories: categories.into_iter().map(String::from).collect(),
            orientations: orientations.into_iter().map(String::from).collect(),
            sizes: sizes.into_iter().map(String::from).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"[
        {
            "id": 1,
            "title": "Monsoon Over Kochi",
            "artist": "R. Menon",
            "description": "Backwaters in the rain",
            "category": "Landscape",
            "orientation": "Portrait",
            "basePrice": 500,
            "popularity": 10,
            "addedAt": "2024-06-01",
            "tags": ["rain"],
            "images": [{ "src": "/img/1.jpg", "alt": "rain" }],
            "variants": [{ "size": "A3", "price": 500 }, { "size": "A2", "price": 800 }]
        },
        {
            "id": 2,
            "title": "Neon Bazaar",
            "artist": "S. Rao",
            "category": "Abstract",
            "orientation": "Landscape",
            "basePrice": 700,
            "addedAt": "2024-07-15T10:30:00Z",
            "images": [],
            "variants": [{ "size": "A1", "price": 700 }]
        }
    ]"#;

    #[test]
    fn test_from_json_applies_defaults() {
        let catalog = Catalog::from_json(DOCUMENT).unwrap();
        assert_eq!(catalog.len(), 2);

        let neon = catalog.get(ProductId::new(2)).unwrap();
        assert_eq!(neon.popularity, 0);
        assert!(neon.description.is_empty());
        assert!(neon.tags.is_empty());
        assert_eq!(neon.thumbnail(), "");
    }

    #[test]
    fn test_added_at_accepts_date_and_timestamp() {
        let catalog = Catalog::from_json(DOCUMENT).unwrap();
        let monsoon = catalog.get(ProductId::new(1)).unwrap();
        let neon = catalog.get(ProductId::new(2)).unwrap();
        assert_eq!(monsoon.added_at.to_rfc3339(), "2024-06-01T00:00:00+00:00");
        assert!(neon.added_at > monsoon.added_at);
    }

    #[test]
    fn test_malformed_document_is_rejected() {
        assert!(matches!(
            Catalog::from_json("{ not json"),
            Err(CatalogError::Malformed(_))
        ));
        assert!(matches!(
            Catalog::from_json(r#"[{"id": 1}]"#),
            Err(CatalogError::Malformed(_))
        ));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let doc = DOCUMENT.replace("\"id\": 2", "\"id\": 1");
        assert!(matches!(
            Catalog::from_json(&doc),
            Err(CatalogError::DuplicateProduct(id)) if id == ProductId::new(1)
        ));
    }

    #[test]
    fn test_empty_variants_are_rejected() {
        let doc = DOCUMENT.replace(r#"[{ "size": "A1", "price": 700 }]"#, "[]");
        assert!(matches!(
            Catalog::from_json(&doc),
            Err(CatalogError::NoVariants(_))
        ));
    }

    #[test]
    fn test_duplicate_sizes_are_rejected() {
        let doc = DOCUMENT.replace(r#""size": "A2""#, r#""size": "A3""#);
        assert!(matches!(
            Catalog::from_json(&doc),
            Err(CatalogError::DuplicateVariant { size, .. }) if size == "A3"
        ));
    }

    #[test]
    fn test_non_positive_price_is_rejected() {
        let doc = DOCUMENT.replace(r#""price": 700"#, r#""price": 0"#);
        assert!(matches!(
            Catalog::from_json(&doc),
            Err(CatalogError::InvalidPrice(_))
        ));
    }

    #[test]
    fn test_facets_are_distinct_and_sorted() {
        let facets = Catalog::from_json(DOCUMENT).unwrap().facets();
        assert_eq!(facets.categories, vec!["Abstract", "Landscape"]);
        assert_eq!(facets.orientations, vec!["Landscape", "Portrait"]);
        assert_eq!(facets.sizes, vec!["A1", "A2", "A3"]);
    }

    #[test]
    fn test_search_text_is_lowercase_concatenation() {
        let catalog = Catalog::from_json(DOCUMENT).unwrap();
        let monsoon = catalog.get(ProductId::new(1)).unwrap();
        assert_eq!(
            monsoon.search_text(),
            "monsoon over kochi r. menon backwaters in the rain rain"
        );
    }

    #[test]
    fn test_variant_lookup() {
        let catalog = Catalog::from_json(DOCUMENT).unwrap();
        let monsoon = catalog.get(ProductId::new(1)).unwrap();
        assert_eq!(monsoon.variant("A2").unwrap().price, Price::from_minor(800));
        assert!(monsoon.variant("A0").is_none());
    }
}

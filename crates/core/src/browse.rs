//! Filter/Sort Engine.
//!
//! [`visible`] is a pure function of the catalog, the search text, the filter
//! selection and the sort key. It holds no state between calls, so callers
//! re-run it on every filter toggle, keystroke or sort change.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use serde::Serialize;

use crate::catalog::Product;

/// One of the independent multi-select filter dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterDimension {
    Category,
    Orientation,
    Size,
}

impl FilterDimension {
    /// All dimensions in display order.
    pub const ALL: [Self; 3] = [Self::Category, Self::Orientation, Self::Size];

    /// Query-string name of the dimension.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Orientation => "orientation",
            Self::Size => "size",
        }
    }

    /// Parse a query-string name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == name)
    }
}

/// Selected filter values per dimension.
///
/// An empty set places no constraint on its dimension. Values within a
/// dimension are OR-ed, dimensions are AND-ed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    pub category: BTreeSet<String>,
    pub orientation: BTreeSet<String>,
    pub size: BTreeSet<String>,
}

impl FilterSelection {
    #[must_use]
    pub const fn values(&self, dimension: FilterDimension) -> &BTreeSet<String> {
        match dimension {
            FilterDimension::Category => &self.category,
            FilterDimension::Orientation => &self.orientation,
            FilterDimension::Size => &self.size,
        }
    }

    fn values_mut(&mut self, dimension: FilterDimension) -> &mut BTreeSet<String> {
        match dimension {
            FilterDimension::Category => &mut self.category,
            FilterDimension::Orientation => &mut self.orientation,
            FilterDimension::Size => &mut self.size,
        }
    }

    /// Add a value to a dimension.
    pub fn select(&mut self, dimension: FilterDimension, value: impl Into<String>) {
        self.values_mut(dimension).insert(value.into());
    }

    /// Flip a value on or off. Returns `true` if the value is now selected.
    pub fn toggle(&mut self, dimension: FilterDimension, value: &str) -> bool {
        let values = self.values_mut(dimension);
        if values.remove(value) {
            false
        } else {
            values.insert(value.to_string());
            true
        }
    }

    #[must_use]
    pub fn is_selected(&self, dimension: FilterDimension, value: &str) -> bool {
        self.values(dimension).contains(value)
    }

    /// Drop every selected value in every dimension.
    pub fn clear(&mut self) {
        self.category.clear();
        self.orientation.clear();
        self.size.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.category.is_empty() && self.orientation.is_empty() && self.size.is_empty()
    }

    /// Whether a product satisfies every non-empty dimension.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        (self.category.is_empty() || self.category.contains(&product.category))
            && (self.orientation.is_empty() || self.orientation.contains(&product.orientation))
            && (self.size.is_empty() || product.offers_any_size(&self.size))
    }
}

/// Ordering applied to the visible product list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum SortKey {
    /// Most popular first.
    #[default]
    #[serde(rename = "popularity")]
    Popularity,
    /// Cheapest base price first.
    #[serde(rename = "price-asc")]
    PriceAsc,
    /// Most expensive base price first.
    #[serde(rename = "price-desc")]
    PriceDesc,
    /// Most recently added first.
    #[serde(rename = "newest")]
    Newest,
}

impl SortKey {
    /// All sort keys in menu order.
    pub const ALL: [Self; 4] = [Self::Popularity, Self::PriceAsc, Self::PriceDesc, Self::Newest];

    /// Parse a sort key. Unknown keys fall back to popularity.
    #[must_use]
    pub fn parse(key: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == key.trim())
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Popularity => "popularity",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::Newest => "newest",
        }
    }

    /// Human-readable menu label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Popularity => "Most popular",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
            Self::Newest => "Newest",
        }
    }
}

/// Compute the ordered list of products to show.
///
/// Search is a case-insensitive substring match over title, artist,
/// description and tags; blank search text matches everything. The sort is
/// stable, so ties keep catalog order.
#[must_use]
pub fn visible<'a>(
    products: &'a [Product],
    search: &str,
    filters: &FilterSelection,
    sort: SortKey,
) -> Vec<&'a Product> {
    let needle = search.trim().to_lowercase();

    let mut list: Vec<&Product> = products
        .iter()
        .filter(|p| needle.is_empty() || p.search_text().contains(&needle))
        .filter(|p| filters.matches(p))
        .collect();

    match sort {
        SortKey::Popularity => list.sort_by_key(|p| Reverse(p.popularity)),
        SortKey::PriceAsc => list.sort_by_key(|p| p.base_price),
        SortKey::PriceDesc => list.sort_by_key(|p| Reverse(p.base_price)),
        SortKey::Newest => list.sort_by_key(|p| Reverse(p.added_at)),
    }

    list
}

/// Result count label, e.g. "1 poster" or "12 posters".
#[must_use]
pub fn results_label(count: usize) -> String {
    if count == 1 {
        "1 poster".to_string()
    } else {
        format!("{count} posters")
    }
}

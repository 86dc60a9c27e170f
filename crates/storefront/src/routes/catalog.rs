//! Catalog View: search box, filter chips, sort menu and product grid.
//!
//! All browse state lives in the query string, so every chip and sort option
//! is a plain link and the page can be bookmarked or shared.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{RawQuery, State};
use tower_sessions::Session;
use tracing::instrument;
use url::form_urlencoded;

use wallposter_core::Product;
use wallposter_core::browse::{self, FilterDimension, FilterSelection, SortKey};

use crate::models::session::load_cart;
use crate::state::AppState;

// =============================================================================
// Query State
// =============================================================================

/// Search, filter and sort state parsed from the query string.
///
/// Filter dimensions are repeatable (`?size=A3&size=A2`); `q` is the search
/// text and `sort` the sort key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseQuery {
    pub search: String,
    pub sort: SortKey,
    pub filters: FilterSelection,
}

impl BrowseQuery {
    /// Parse a raw query string. Unknown parameters are ignored.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let mut query = Self::default();
        let Some(raw) = raw else {
            return query;
        };

        for (name, value) in form_urlencoded::parse(raw.as_bytes()) {
            match name.as_ref() {
                "q" => query.search = value.trim().to_string(),
                "sort" => query.sort = SortKey::parse(&value),
                other => {
                    if let Some(dimension) = FilterDimension::parse(other)
                        && !value.is_empty()
                    {
                        query.filters.select(dimension, value.into_owned());
                    }
                }
            }
        }
        query
    }

    /// Encode back into a query string (without the leading `?`).
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if !self.search.is_empty() {
            serializer.append_pair("q", &self.search);
        }
        if self.sort != SortKey::default() {
            serializer.append_pair("sort", self.sort.as_str());
        }
        for dimension in FilterDimension::ALL {
            for value in self.filters.values(dimension) {
                serializer.append_pair(dimension.as_str(), value);
            }
        }
        serializer.finish()
    }

    /// Link to the catalog page with this state.
    #[must_use]
    pub fn href(&self) -> String {
        let query = self.to_query_string();
        if query.is_empty() {
            "/".to_string()
        } else {
            format!("/?{query}")
        }
    }

    /// The same state with one filter value toggled.
    #[must_use]
    pub fn toggled(&self, dimension: FilterDimension, value: &str) -> Self {
        let mut next = self.clone();
        next.filters.toggle(dimension, value);
        next
    }

    /// The same state with every filter cleared.
    #[must_use]
    pub fn without_filters(&self) -> Self {
        let mut next = self.clone();
        next.filters.clear();
        next
    }

    /// Run the Filter/Sort Engine over the catalog.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        browse::visible(products, &self.search, &self.filters, self.sort)
    }
}

// =============================================================================
// Views
// =============================================================================

/// Product card display data for templates.
#[derive(Clone)]
pub struct ProductCardView {
    pub href: String,
    pub title: String,
    pub artist: String,
    pub thumbnail: String,
    pub alt: String,
    pub price: String,
    pub category: String,
    pub orientation: String,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            href: format!("/products/{}", product.id),
            title: product.title.clone(),
            artist: product.artist.clone(),
            thumbnail: product.thumbnail().to_string(),
            alt: product
                .primary_image()
                .map_or_else(|| product.title.clone(), |image| image.alt.clone()),
            price: product.base_price.display(),
            category: product.category.clone(),
            orientation: product.orientation.clone(),
        }
    }
}

/// One filter chip.
#[derive(Clone)]
pub struct FilterChipView {
    pub value: String,
    pub href: String,
    pub selected: bool,
}

/// A filter dimension with its chips.
#[derive(Clone)]
pub struct FilterGroupView {
    pub label: &'static str,
    pub chips: Vec<FilterChipView>,
}

/// One sort menu entry.
#[derive(Clone)]
pub struct SortOptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn filter_groups(query: &BrowseQuery, state: &AppState) -> Vec<FilterGroupView> {
    let facets = state.catalog().facets();
    [
        (FilterDimension::Category, "Category", facets.categories),
        (FilterDimension::Orientation, "Orientation", facets.orientations),
        (FilterDimension::Size, "Size", facets.sizes),
    ]
    .into_iter()
    .map(|(dimension, label, values)| FilterGroupView {
        label,
        chips: values
            .into_iter()
            .map(|value| FilterChipView {
                href: query.toggled(dimension, &value).href(),
                selected: query.filters.is_selected(dimension, &value),
                value,
            })
            .collect(),
    })
    .collect()
}

fn sort_options(selected: SortKey) -> Vec<SortOptionView> {
    SortKey::ALL
        .into_iter()
        .map(|key| SortOptionView {
            value: key.as_str(),
            label: key.label(),
            selected: key == selected,
        })
        .collect()
}

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/index.html")]
pub struct CatalogIndexTemplate {
    pub search: String,
    pub sort_options: Vec<SortOptionView>,
    pub filter_groups: Vec<FilterGroupView>,
    /// Hidden inputs that keep the active filters when the search form submits.
    pub filter_inputs: Vec<(&'static str, String)>,
    pub has_filters: bool,
    pub clear_href: String,
    pub products: Vec<ProductCardView>,
    pub results_label: String,
    pub catalog_error: String,
    pub cart_count: u32,
}

/// Display the catalog page.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RawQuery(raw): RawQuery,
) -> CatalogIndexTemplate {
    let query = BrowseQuery::parse(raw.as_deref());
    let visible = query.apply(state.catalog().products());
    let cart_count = load_cart(&session).await.item_count();

    let filter_inputs = FilterDimension::ALL
        .into_iter()
        .flat_map(|dimension| {
            query
                .filters
                .values(dimension)
                .iter()
                .map(move |value| (dimension.as_str(), value.clone()))
        })
        .collect();

    CatalogIndexTemplate {
        search: query.search.clone(),
        sort_options: sort_options(query.sort),
        filter_groups: filter_groups(&query, &state),
        filter_inputs,
        has_filters: !query.filters.is_empty(),
        clear_href: query.without_filters().href(),
        results_label: browse::results_label(visible.len()),
        products: visible.into_iter().map(ProductCardView::from).collect(),
        catalog_error: state.catalog_error().unwrap_or_default().to_string(),
        cart_count,
    }
}

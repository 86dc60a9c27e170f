//! Catalog JSON endpoints.

use axum::{
    Json,
    extract::{Path, RawQuery, State},
};
use serde::Serialize;
use tracing::instrument;

use wallposter_core::Product;
use wallposter_core::browse::{SortKey, results_label};

use crate::error::{AppError, Result};
use crate::routes::catalog::BrowseQuery;
use crate::state::AppState;

/// Visible product list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductList {
    pub count: usize,
    pub label: String,
    pub sort: SortKey,
    pub products: Vec<Product>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_error: Option<String>,
}

/// List products matching the search, filter and sort parameters.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Json<ProductList> {
    let query = BrowseQuery::parse(raw.as_deref());
    let products: Vec<Product> = query
        .apply(state.catalog().products())
        .into_iter()
        .cloned()
        .collect();

    Json(ProductList {
        count: products.len(),
        label: results_label(products.len()),
        sort: query.sort,
        products,
        catalog_error: state.catalog_error().map(String::from),
    })
}

/// Get one product by id.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Product>> {
    id.parse()
        .ok()
        .and_then(|id| state.catalog().get(id))
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

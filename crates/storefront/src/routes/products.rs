//! Product detail handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use wallposter_core::{Product, ProductId};

use crate::models::session::load_cart;
use crate::state::AppState;

/// Image display data for templates.
#[derive(Clone)]
pub struct ImageView {
    pub src: String,
    pub alt: String,
}

/// Size option display data for templates.
#[derive(Clone)]
pub struct VariantView {
    pub size: String,
    pub price: String,
}

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub description: String,
    pub category: String,
    pub orientation: String,
    pub price: String,
    pub images: Vec<ImageView>,
    pub variants: Vec<VariantView>,
    pub tags: Vec<String>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            title: product.title.clone(),
            artist: product.artist.clone(),
            description: product.description.clone(),
            category: product.category.clone(),
            orientation: product.orientation.clone(),
            price: product.base_price.display(),
            images: product
                .images
                .iter()
                .map(|image| ImageView {
                    src: image.src.clone(),
                    alt: if image.alt.is_empty() {
                        product.title.clone()
                    } else {
                        image.alt.clone()
                    },
                })
                .collect(),
            variants: product
                .variants
                .iter()
                .map(|variant| VariantView {
                    size: variant.size.clone(),
                    price: variant.price.display(),
                })
                .collect(),
            tags: product.tags.clone(),
        }
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
    pub cart_count: u32,
}

/// Shown for an unknown or removed product.
#[derive(Template, WebTemplate)]
#[template(path = "products/not_found.html")]
pub struct ProductNotFoundTemplate {
    pub requested: String,
    pub cart_count: u32,
}

/// Display a product detail page.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    let cart_count = load_cart(&session).await.item_count();
    let product = id
        .parse::<ProductId>()
        .ok()
        .and_then(|id| state.catalog().get(id));

    match product {
        Some(product) => ProductShowTemplate {
            product: ProductView::from(product),
            cart_count,
        }
        .into_response(),
        None => {
            tracing::debug!(%id, "Product not found");
            (
                StatusCode::NOT_FOUND,
                ProductNotFoundTemplate {
                    requested: id,
                    cart_count,
                },
            )
                .into_response()
        }
    }
}

//! Cart route handlers.
//!
//! Each mutation restores the cart from the session, applies one Cart Engine
//! operation, writes the snapshot back and redirects to the cart page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use wallposter_core::ProductId;
use wallposter_core::cart::{Cart, CartLine, LineKey};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::session::{load_cart, save_cart};
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub key: String,
    pub href: String,
    pub title: String,
    pub thumbnail: String,
    pub size: String,
    pub unit_price: String,
    pub quantity: u32,
    pub line_total: String,
    pub can_decrement: bool,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            key: line.key.to_string(),
            href: format!("/products/{}", line.product_id),
            title: line.title.clone(),
            thumbnail: line.thumbnail.clone(),
            size: line.variant.size.clone(),
            unit_price: line.unit_price.display(),
            quantity: line.quantity,
            line_total: line.line_total().display(),
            can_decrement: line.quantity > 1,
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    pub grand_total: String,
    pub item_count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        let totals = cart.totals();
        Self {
            lines: cart.lines().iter().map(CartLineView::from).collect(),
            subtotal: totals.subtotal.display(),
            grand_total: totals.grand_total.display(),
            item_count: totals.item_count,
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub size: String,
}

/// Form data naming one cart line.
#[derive(Debug, Deserialize)]
pub struct LineForm {
    pub key: String,
}

impl LineForm {
    fn line_key(&self) -> Result<LineKey> {
        self.key
            .parse()
            .map_err(|e: wallposter_core::cart::LineKeyError| AppError::BadRequest(e.to_string()))
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub cart_count: u32,
}

/// Cart count badge fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Display cart page.
#[instrument(skip(session))]
pub async fn show(session: Session) -> CartShowTemplate {
    let cart = load_cart(&session).await;
    CartShowTemplate {
        cart: CartView::from(&cart),
        cart_count: cart.item_count(),
    }
}

/// Add one unit of a product variant to the cart.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product = state
        .catalog()
        .get(form.product_id)
        .ok_or_else(|| AppError::NotFound(format!("product {}", form.product_id)))?;

    let mut cart = load_cart(&session).await;
    let quantity = cart.add(product, &form.size)?;
    save_cart(&session, &cart).await?;

    let product_id = form.product_id.to_string();
    add_breadcrumb(
        "cart",
        "Added to cart",
        &[("product_id", product_id.as_str()), ("size", form.size.as_str())],
    );
    tracing::debug!(product_id = %form.product_id, size = %form.size, quantity, "Cart line added");

    Ok(Redirect::to("/cart").into_response())
}

/// Increase a line's quantity by one.
#[instrument(skip(session))]
pub async fn increment(session: Session, Form(form): Form<LineForm>) -> Result<Response> {
    let key = form.line_key()?;
    let mut cart = load_cart(&session).await;
    cart.increment(&key)?;
    save_cart(&session, &cart).await?;
    Ok(Redirect::to("/cart").into_response())
}

/// Decrease a line's quantity by one; a line never drops below one.
#[instrument(skip(session))]
pub async fn decrement(session: Session, Form(form): Form<LineForm>) -> Result<Response> {
    let key = form.line_key()?;
    let mut cart = load_cart(&session).await;
    cart.decrement(&key)?;
    save_cart(&session, &cart).await?;
    Ok(Redirect::to("/cart").into_response())
}

/// Remove a line from the cart.
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<LineForm>) -> Result<Response> {
    let key = form.line_key()?;
    let mut cart = load_cart(&session).await;
    let removed = cart.remove(&key)?;
    save_cart(&session, &cart).await?;

    let key = removed.key.to_string();
    add_breadcrumb("cart", "Removed from cart", &[("key", key.as_str())]);
    Ok(Redirect::to("/cart").into_response())
}

/// Get cart count badge.
#[instrument(skip(session))]
pub async fn count(session: Session) -> CartCountTemplate {
    CartCountTemplate {
        count: load_cart(&session).await.item_count(),
    }
}

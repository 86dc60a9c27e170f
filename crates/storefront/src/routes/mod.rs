//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Catalog View (?q=&sort=&category=&orientation=&size=)
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check
//!
//! # Products
//! GET  /products/{id}          - Product detail (404 page when missing)
//!
//! # Cart
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add one unit of a variant
//! POST /cart/increment         - Increase a line's quantity
//! POST /cart/decrement         - Decrease a line's quantity (floor 1)
//! POST /cart/remove            - Remove a line
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /checkout               - Summary and shipping form
//! POST /checkout               - Submit the order
//!
//! # JSON API
//! GET  /api/products           - Visible product list (same query as /)
//! GET  /api/products/{id}      - One product
//! POST /api/order              - Order Service
//!
//! # Assets
//! GET  /static/*               - CSS and the bundled catalog
//! ```

pub mod api;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod health;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::MemoryStore;
use tower_sessions_sqlx_store::PostgresStore;

use crate::middleware::{create_session_layer, request_id, request_id_middleware};
use crate::state::AppState;

/// Directory served under `/static`.
pub const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/increment", post(cart::increment))
        .route("/decrement", post(cart::decrement))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(api::products::index))
        .route("/products/{id}", get(api::products::show))
        .route("/order", post(api::orders::create))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::index))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/products/{id}", get(products::show))
        .nest("/cart", cart_routes())
        .route("/checkout", get(checkout::show).post(checkout::submit))
        .nest("/api", api_routes())
}

/// Build the complete application: routes, static assets, sessions,
/// request tracing and Sentry.
pub fn app(state: AppState) -> Router {
    let router = routes()
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(request_id::make_span));

    // Sessions live next to the orders when there is a database.
    let router = match state.pool() {
        Some(pool) => router.layer(create_session_layer(
            PostgresStore::new(pool.clone()),
            state.config(),
        )),
        None => router.layer(create_session_layer(MemoryStore::default(), state.config())),
    };

    router
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

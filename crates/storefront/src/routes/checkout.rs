//! Checkout page: order summary, shipping form and submission.
//!
//! Every rendered form carries an idempotency key. A failed submission
//! re-renders the form with the same key, so a retry can never create a
//! second order for the same attempt.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use wallposter_core::OrderId;
use wallposter_core::checkout::{CheckoutError, CheckoutFlow, CheckoutSummary};
use wallposter_core::order::{IdempotencyKey, ShippingDetails};

use crate::error::Result;
use crate::models::session::{clear_cart, load_cart};
use crate::routes::cart::CartView;
use crate::state::AppState;

/// Checkout form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
    pub idempotency_key: String,
    #[serde(flatten)]
    pub shipping: ShippingDetails,
}

/// Summary display data for templates.
#[derive(Clone)]
pub struct SummaryView {
    pub subtotal: String,
    pub shipping: String,
    pub discount: String,
    pub total: String,
    pub item_count: u32,
}

impl From<&CheckoutSummary> for SummaryView {
    fn from(summary: &CheckoutSummary) -> Self {
        Self {
            subtotal: summary.subtotal.display(),
            shipping: summary.shipping.display(),
            discount: summary.discount.display(),
            total: summary.total.display(),
            item_count: summary.item_count,
        }
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutShowTemplate {
    pub cart: CartView,
    pub summary: SummaryView,
    pub shipping: ShippingDetails,
    pub idempotency_key: String,
    pub error: String,
    pub is_empty: bool,
    pub cart_count: u32,
}

impl CheckoutShowTemplate {
    fn new(flow: &CheckoutFlow, shipping: ShippingDetails, key: &IdempotencyKey) -> Self {
        Self {
            cart: CartView::from(flow.cart()),
            summary: SummaryView::from(flow.summary()),
            shipping,
            idempotency_key: key.as_str().to_string(),
            error: flow.error_message().unwrap_or_default().to_string(),
            is_empty: flow.cart().is_empty(),
            cart_count: flow.cart().item_count(),
        }
    }
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    pub order_id: String,
    pub name: String,
    pub total: String,
    pub cart_count: u32,
}

/// Display the checkout page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> CheckoutShowTemplate {
    let flow = CheckoutFlow::start(load_cart(&session).await, state.shipping_fee());
    CheckoutShowTemplate::new(&flow, ShippingDetails::default(), &IdempotencyKey::generate())
}

/// Submit the order.
#[instrument(skip(state, session, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let key = IdempotencyKey::parse(&form.idempotency_key).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Checkout form had no usable idempotency key");
        IdempotencyKey::generate()
    });
    let shipping = form.shipping;

    let mut flow = CheckoutFlow::start(load_cart(&session).await, state.shipping_fee());
    let request = match flow.submit(shipping.clone()) {
        Ok(request) => request,
        Err(e) => {
            if e != CheckoutError::EmptyCart {
                tracing::warn!(error = %e, "Unexpected checkout state");
            }
            return Ok(CheckoutShowTemplate::new(&flow, shipping, &key).into_response());
        }
    };

    let result = state.submitter().submit(request, key.clone()).await;
    if let Err(e) = &result {
        tracing::warn!(error = %e, "Order submission failed");
    }
    let order_id = result.as_ref().ok().copied();
    if let Err(e) = flow.finish(result) {
        tracing::warn!(error = %e, "Unexpected checkout state");
    }

    match order_id {
        Some(order_id) if flow.should_clear_cart() => {
            clear_cart(&session).await?;
            Ok(confirmation(order_id, &shipping, &flow).into_response())
        }
        _ => Ok(CheckoutShowTemplate::new(&flow, shipping, &key).into_response()),
    }
}

fn confirmation(
    order_id: OrderId,
    shipping: &ShippingDetails,
    flow: &CheckoutFlow,
) -> ConfirmationTemplate {
    tracing::info!(%order_id, "Checkout confirmed");
    ConfirmationTemplate {
        order_id: order_id.to_string(),
        name: shipping.name.clone(),
        total: flow.summary().total.display(),
        cart_count: 0,
    }
}

//! Checkout Flow: summary, order payload and submission state.
//!
//! A [`CheckoutFlow`] reads the cart once when it starts and does not track
//! later cart changes. Submission moves it through
//! `Editing -> Submitting -> Confirmed | Failed`; a failed flow can be
//! submitted again, a submitting or confirmed one cannot.

use serde::Serialize;
use thiserror::Error;

use crate::cart::Cart;
use crate::order::{OrderItem, OrderRequest, ShippingDetails};
use crate::types::{OrderId, Price};

/// Shown when an order cannot be delivered to the order service at all.
pub const TRANSPORT_FAILURE_MESSAGE: &str =
    "Could not reach the order service. Please check your connection and try again.";

/// Shown when checkout is attempted with nothing in the cart.
pub const EMPTY_CART_MESSAGE: &str = "Your cart is empty.";

/// Why an order submission failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// The order service answered with an error message.
    #[error("order rejected: {0}")]
    Rejected(String),

    /// The order service could not be reached or timed out.
    #[error("order service unreachable: {0}")]
    Transport(String),
}

impl SubmitError {
    /// Message to show the shopper.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Rejected(message) => message,
            Self::Transport(_) => TRANSPORT_FAILURE_MESSAGE,
        }
    }
}

/// Invalid checkout state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("the cart is empty")]
    EmptyCart,
    #[error("an order submission is already in progress")]
    AlreadySubmitting,
    #[error("the order has already been placed")]
    AlreadyConfirmed,
    #[error("no order submission is in progress")]
    NotSubmitting,
}

/// Price breakdown shown next to the checkout form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckoutSummary {
    pub subtotal: Price,
    pub shipping: Price,
    pub discount: Price,
    pub total: Price,
    pub item_count: u32,
}

impl CheckoutSummary {
    /// Subtotal plus the flat shipping fee (waived for an empty cart) minus
    /// the discount, which is always zero.
    #[must_use]
    pub fn for_cart(cart: &Cart, shipping_fee: Price) -> Self {
        let subtotal = cart.subtotal();
        let shipping = if cart.is_empty() {
            Price::ZERO
        } else {
            shipping_fee
        };
        let discount = Price::ZERO;

        Self {
            subtotal,
            shipping,
            discount,
            total: subtotal + shipping - discount,
            item_count: cart.item_count(),
        }
    }
}

/// Build the order payload: shipping fields plus title, size and quantity
/// per line. Unit prices are left out; the server prices the order itself.
#[must_use]
pub fn order_request(shipping: ShippingDetails, cart: &Cart) -> OrderRequest {
    OrderRequest {
        shipping,
        items: cart
            .lines()
            .iter()
            .map(|line| OrderItem {
                title: line.title.clone(),
                size: line.variant.size.clone(),
                qty: line.quantity,
                product_id: Some(line.product_id),
            })
            .collect(),
    }
}

/// Where a checkout currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    Editing,
    Submitting,
    Confirmed(OrderId),
    Failed(String),
}

/// One checkout attempt over a cart snapshot.
#[derive(Debug, Clone)]
pub struct CheckoutFlow {
    cart: Cart,
    summary: CheckoutSummary,
    state: CheckoutState,
}

impl CheckoutFlow {
    /// Start a checkout over a snapshot of the cart.
    #[must_use]
    pub fn start(cart: Cart, shipping_fee: Price) -> Self {
        let summary = CheckoutSummary::for_cart(&cart, shipping_fee);
        Self {
            cart,
            summary,
            state: CheckoutState::Editing,
        }
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub const fn summary(&self) -> &CheckoutSummary {
        &self.summary
    }

    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// The message to show after a failed submission, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            CheckoutState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Whether the stored cart should now be cleared.
    #[must_use]
    pub const fn should_clear_cart(&self) -> bool {
        matches!(self.state, CheckoutState::Confirmed(_))
    }

    /// Begin submitting an order and return the payload to send.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::AlreadySubmitting` while a submission is in
    /// flight, `AlreadyConfirmed` after success, and `EmptyCart` when there
    /// is nothing to order.
    pub fn submit(&mut self, shipping: ShippingDetails) -> Result<OrderRequest, CheckoutError> {
        match self.state {
            CheckoutState::Submitting => return Err(CheckoutError::AlreadySubmitting),
            CheckoutState::Confirmed(_) => return Err(CheckoutError::AlreadyConfirmed),
            CheckoutState::Editing | CheckoutState::Failed(_) => {}
        }
        if self.cart.is_empty() {
            self.state = CheckoutState::Failed(EMPTY_CART_MESSAGE.to_string());
            return Err(CheckoutError::EmptyCart);
        }

        self.state = CheckoutState::Submitting;
        Ok(order_request(shipping, &self.cart))
    }

    /// Record the outcome of the submission started by [`submit`](Self::submit).
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NotSubmitting` if no submission is in flight.
    pub fn finish(&mut self, result: Result<OrderId, SubmitError>) -> Result<(), CheckoutError> {
        if self.state != CheckoutState::Submitting {
            return Err(CheckoutError::NotSubmitting);
        }

        self.state = match result {
            Ok(order_id) => CheckoutState::Confirmed(order_id),
            Err(err) => CheckoutState::Failed(err.user_message().to_string()),
        };
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::types::ProductId;

    const SHIPPING_FEE: Price = Price::from_minor(9900);

    fn cart_with_two_a3() -> Cart {
        let catalog = Catalog::from_json(
            r#"[{
                "id": 1, "title": "Monsoon", "artist": "R. Menon",
                "category": "Landscape", "orientation": "Portrait",
                "basePrice": 500, "addedAt": "2024-01-01",
                "variants": [{ "size": "A3", "price": 500 }, { "size": "A2", "price": 800 }]
            }]"#,
        )
        .unwrap();
        let product = catalog.get(ProductId::new(1)).unwrap();
        let mut cart = Cart::new();
        cart.add(product, "A3").unwrap();
        cart.add(product, "A3").unwrap();
        cart
    }

    #[test]
    fn test_empty_cart_summary_has_no_shipping() {
        let summary = CheckoutSummary::for_cart(&Cart::new(), SHIPPING_FEE);
        assert_eq!(summary.shipping, Price::ZERO);
        assert_eq!(summary.total, Price::ZERO);
        assert_eq!(summary.discount, Price::ZERO);
    }

    #[test]
    fn test_summary_adds_flat_shipping() {
        let summary = CheckoutSummary::for_cart(&cart_with_two_a3(), SHIPPING_FEE);
        assert_eq!(summary.subtotal, Price::from_minor(1000));
        assert_eq!(summary.shipping, SHIPPING_FEE);
        assert_eq!(summary.total, Price::from_minor(10_900));
        assert_eq!(summary.item_count, 2);
    }

    #[test]
    fn test_order_request_omits_prices() {
        let request = order_request(ShippingDetails::default(), &cart_with_two_a3());
        assert_eq!(request.items.len(), 1);
        let item = &request.items[0];
        assert_eq!((item.title.as_str(), item.size.as_str(), item.qty), ("Monsoon", "A3", 2));

        let json = serde_json::to_value(&request).unwrap();
        assert!(json["items"][0].get("price").is_none());
    }

    #[test]
    fn test_successful_submission_confirms_and_clears() {
        let mut flow = CheckoutFlow::start(cart_with_two_a3(), SHIPPING_FEE);
        flow.submit(ShippingDetails::default()).unwrap();
        assert_eq!(flow.state(), &CheckoutState::Submitting);

        let id = OrderId::generate();
        flow.finish(Ok(id)).unwrap();
        assert_eq!(flow.state(), &CheckoutState::Confirmed(id));
        assert!(flow.should_clear_cart());
        assert_eq!(
            flow.submit(ShippingDetails::default()),
            Err(CheckoutError::AlreadyConfirmed)
        );
    }

    #[test]
    fn test_second_submit_while_in_flight_is_refused() {
        let mut flow = CheckoutFlow::start(cart_with_two_a3(), SHIPPING_FEE);
        flow.submit(ShippingDetails::default()).unwrap();
        assert_eq!(
            flow.submit(ShippingDetails::default()),
            Err(CheckoutError::AlreadySubmitting)
        );
    }

    #[test]
    fn test_rejection_keeps_server_message_and_cart() {
        let mut flow = CheckoutFlow::start(cart_with_two_a3(), SHIPPING_FEE);
        flow.submit(ShippingDetails::default()).unwrap();
        flow.finish(Err(SubmitError::Rejected("Failed to save order".to_string())))
            .unwrap();

        assert_eq!(flow.error_message(), Some("Failed to save order"));
        assert!(!flow.should_clear_cart());
        assert!(!flow.cart().is_empty());

        // retry is allowed after a failure
        assert!(flow.submit(ShippingDetails::default()).is_ok());
    }

    #[test]
    fn test_transport_failure_uses_generic_message() {
        let mut flow = CheckoutFlow::start(cart_with_two_a3(), SHIPPING_FEE);
        flow.submit(ShippingDetails::default()).unwrap();
        flow.finish(Err(SubmitError::Transport("connection refused".to_string())))
            .unwrap();
        assert_eq!(flow.error_message(), Some(TRANSPORT_FAILURE_MESSAGE));
    }

    #[test]
    fn test_empty_cart_cannot_be_submitted() {
        let mut flow = CheckoutFlow::start(Cart::new(), SHIPPING_FEE);
        assert_eq!(
            flow.submit(ShippingDetails::default()),
            Err(CheckoutError::EmptyCart)
        );
        assert_eq!(flow.error_message(), Some(EMPTY_CART_MESSAGE));
    }

    #[test]
    fn test_finish_without_submit_is_an_error() {
        let mut flow = CheckoutFlow::start(cart_with_two_a3(), SHIPPING_FEE);
        assert_eq!(
            flow.finish(Ok(OrderId::generate())),
            Err(CheckoutError::NotSubmitting)
        );
    }
}

//! Order submission for the checkout page.
//!
//! Checkout hands its payload to an [`OrderSubmitter`], which either calls
//! the in-process [`OrderService`] or POSTs to a remote order service. Both
//! paths are bounded by the configured timeout, and both report failures as
//! a [`SubmitError`] the checkout flow knows how to show.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use wallposter_core::OrderId;
use wallposter_core::checkout::SubmitError;
use wallposter_core::order::{
    ErrorBody, IDEMPOTENCY_KEY_HEADER, IdempotencyKey, ORDER_SAVE_FAILED_MESSAGE, OrderCreated,
    OrderRequest,
};

use super::orders::{OrderService, OrderServiceError};

/// Path of the order endpoint, relative to the service base URL.
const ORDER_PATH: &str = "api/order";

/// Errors building the remote order client.
#[derive(Debug, Error)]
pub enum OrderClientError {
    #[error("invalid order service URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// HTTP client for a remote order service.
#[derive(Clone)]
pub struct OrderClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl OrderClient {
    /// Create a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint URL cannot be built or the HTTP client
    /// fails to build.
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, OrderClientError> {
        let endpoint = base_url.join(ORDER_PATH)?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { client, endpoint })
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// POST an order and return the id the service assigned.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError::Transport` if the service cannot be reached or
    /// answers with something other than an order body, and
    /// `SubmitError::Rejected` with the service's message otherwise.
    pub async fn submit(
        &self,
        request: &OrderRequest,
        idempotency_key: &IdempotencyKey,
    ) -> Result<OrderId, SubmitError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(IDEMPOTENCY_KEY_HEADER, idempotency_key.as_str())
            .json(request)
            .send()
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;
        let status = response.status();

        if status.is_success() {
            let created: OrderCreated = response
                .json()
                .await
                .map_err(|e| SubmitError::Transport(format!("unexpected response body: {e}")))?;
            return Ok(created.order_id);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.error)
            .unwrap_or_else(|_| fallback_message(status));
        Err(SubmitError::Rejected(message))
    }
}

fn fallback_message(status: StatusCode) -> String {
    if status.is_server_error() {
        ORDER_SAVE_FAILED_MESSAGE.to_string()
    } else {
        format!("Order rejected ({status})")
    }
}

/// How checkout submits orders.
#[derive(Clone)]
pub enum OrderSubmitter {
    /// Save in-process through the local order service.
    Local {
        service: OrderService,
        timeout: Duration,
    },
    /// POST to a remote order service.
    Remote(OrderClient),
}

impl OrderSubmitter {
    /// Submit an order on behalf of the checkout page.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError::Transport` on timeouts or connection failures,
    /// `SubmitError::Rejected` when the order could not be saved.
    pub async fn submit(
        &self,
        request: OrderRequest,
        idempotency_key: IdempotencyKey,
    ) -> Result<OrderId, SubmitError> {
        match self {
            Self::Local { service, timeout } => {
                match tokio::time::timeout(*timeout, service.place(request, Some(idempotency_key)))
                    .await
                {
                    Ok(Ok(order)) => Ok(order.id),
                    Ok(Err(OrderServiceError::Invalid(e))) => {
                        tracing::warn!(error = %e, "Order refused");
                        Err(SubmitError::Rejected(e.to_string()))
                    }
                    Ok(Err(e)) => {
                        tracing::error!(error = %e, "Failed to save order");
                        Err(SubmitError::Rejected(ORDER_SAVE_FAILED_MESSAGE.to_string()))
                    }
                    Err(_) => Err(SubmitError::Transport(format!(
                        "order service timed out after {}s",
                        timeout.as_secs()
                    ))),
                }
            }
            Self::Remote(client) => client.submit(&request, &idempotency_key).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use wallposter_core::Catalog;

    use super::*;
    use crate::services::orders::OrderStore;

    #[test]
    fn test_endpoint_joins_order_path() {
        let base = Url::parse("http://orders.internal:4000/").unwrap();
        let client = OrderClient::new(&base, Duration::from_secs(5)).unwrap();
        assert_eq!(client.endpoint().as_str(), "http://orders.internal:4000/api/order");
    }

    #[test]
    fn test_fallback_message() {
        assert_eq!(
            fallback_message(StatusCode::INTERNAL_SERVER_ERROR),
            "Failed to save order"
        );
        assert_eq!(
            fallback_message(StatusCode::BAD_REQUEST),
            "Order rejected (400 Bad Request)"
        );
    }

    #[tokio::test]
    async fn test_local_submit_returns_order_id() {
        let service = OrderService::new(OrderStore::memory(), Arc::new(Catalog::empty()));
        let submitter = OrderSubmitter::Local {
            service: service.clone(),
            timeout: Duration::from_secs(5),
        };

        let key = IdempotencyKey::generate();
        let first = submitter
            .submit(OrderRequest::default(), key.clone())
            .await
            .unwrap();
        let again = submitter.submit(OrderRequest::default(), key).await.unwrap();
        assert_eq!(first, again);
    }

    #[tokio::test]
    async fn test_unreachable_remote_is_transport_failure() {
        // Port 9 (discard) on localhost is not expected to accept connections.
        let base = Url::parse("http://127.0.0.1:9/").unwrap();
        let submitter =
            OrderSubmitter::Remote(OrderClient::new(&base, Duration::from_secs(2)).unwrap());

        let err = submitter
            .submit(OrderRequest::default(), IdempotencyKey::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Transport(_)));
    }
}

//! Order Service endpoint.
//!
//! `POST /api/order` accepts `{shipping, items}` and answers
//! `{message, orderId}`. Missing fields default to empty. An optional
//! `Idempotency-Key` header makes retries return the original order.

use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use tracing::instrument;

use wallposter_core::order::{IDEMPOTENCY_KEY_HEADER, IdempotencyKey, OrderCreated, OrderRequest};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create an order.
#[instrument(skip(state, headers, body))]
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<OrderCreated>> {
    let request: OrderRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid order body: {e}")))?;
    let idempotency_key = idempotency_key(&headers)?;

    let order = state.orders().place(request, idempotency_key).await?;
    Ok(Json(OrderCreated::new(order.id)))
}

fn idempotency_key(headers: &HeaderMap) -> Result<Option<IdempotencyKey>> {
    let Some(value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AppError::BadRequest("Idempotency-Key must be visible ASCII".to_string()))?;
    IdempotencyKey::parse(value)
        .map(Some)
        .map_err(|e| AppError::BadRequest(format!("Invalid Idempotency-Key: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_idempotency_key_header() {
        let mut headers = HeaderMap::new();
        assert!(idempotency_key(&headers).unwrap().is_none());

        headers.insert(IDEMPOTENCY_KEY_HEADER, HeaderValue::from_static("retry-1"));
        assert_eq!(idempotency_key(&headers).unwrap().unwrap().as_str(), "retry-1");

        headers.insert(IDEMPOTENCY_KEY_HEADER, HeaderValue::from_static(""));
        assert!(matches!(idempotency_key(&headers), Err(AppError::BadRequest(_))));
    }
}

//! Order Service: prices and persists incoming orders.
//!
//! Every order is re-priced against the loaded catalog before it is saved.
//! A request carrying an idempotency key that was already used resolves to
//! the order saved the first time instead of creating a second one.

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::Mutex;

use wallposter_core::Catalog;
use wallposter_core::order::{IdempotencyKey, Order, OrderError, OrderRequest};

use crate::db::{OrderRepository, RepositoryError};

/// Errors that can occur while saving an order.
#[derive(Debug, Error)]
pub enum OrderServiceError {
    /// The order store rejected or could not be reached.
    #[error("order store error: {0}")]
    Repository(#[from] RepositoryError),

    /// The request cannot be turned into an order.
    #[error("{0}")]
    Invalid(#[from] OrderError),
}

/// Where orders are kept.
#[derive(Clone)]
pub enum OrderStore {
    /// `storefront.orders` in `PostgreSQL`.
    Postgres(PgPool),
    /// Process memory; orders are lost on restart.
    Memory(Arc<Mutex<Vec<Order>>>),
}

impl OrderStore {
    /// An empty in-memory store.
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(Arc::new(Mutex::new(Vec::new())))
    }

    async fn find_by_idempotency_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<Order>, RepositoryError> {
        match self {
            Self::Postgres(pool) => OrderRepository::new(pool).find_by_idempotency_key(key).await,
            Self::Memory(orders) => Ok(orders
                .lock()
                .await
                .iter()
                .find(|order| order.idempotency_key.as_ref() == Some(key))
                .cloned()),
        }
    }

    async fn insert(&self, order: &Order) -> Result<(), RepositoryError> {
        match self {
            Self::Postgres(pool) => OrderRepository::new(pool).insert(order).await,
            Self::Memory(orders) => {
                let mut orders = orders.lock().await;
                if let Some(key) = &order.idempotency_key
                    && orders.iter().any(|o| o.idempotency_key.as_ref() == Some(key))
                {
                    return Err(RepositoryError::Conflict(
                        "idempotency key already used".to_owned(),
                    ));
                }
                orders.push(order.clone());
                Ok(())
            }
        }
    }

    /// Most recent orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be read.
    pub async fn recent(&self, limit: usize) -> Result<Vec<Order>, RepositoryError> {
        match self {
            Self::Postgres(pool) => {
                let limit = i64::try_from(limit).unwrap_or(i64::MAX);
                OrderRepository::new(pool).recent(limit).await
            }
            Self::Memory(orders) => Ok(orders
                .lock()
                .await
                .iter()
                .rev()
                .take(limit)
                .cloned()
                .collect()),
        }
    }
}

/// Prices and saves orders.
#[derive(Clone)]
pub struct OrderService {
    store: OrderStore,
    catalog: Arc<Catalog>,
}

impl OrderService {
    #[must_use]
    pub const fn new(store: OrderStore, catalog: Arc<Catalog>) -> Self {
        Self { store, catalog }
    }

    #[must_use]
    pub const fn store(&self) -> &OrderStore {
        &self.store
    }

    /// Price and save an order, or return the order already saved under
    /// the same idempotency key.
    ///
    /// # Errors
    ///
    /// Returns `OrderServiceError::Invalid` if the order total overflows,
    /// or `OrderServiceError::Repository` if the order cannot be saved.
    pub async fn place(
        &self,
        request: OrderRequest,
        idempotency_key: Option<IdempotencyKey>,
    ) -> Result<Order, OrderServiceError> {
        if let Some(key) = &idempotency_key
            && let Some(existing) = self.store.find_by_idempotency_key(key).await?
        {
            tracing::info!(order_id = %existing.id, "Order replayed for idempotency key");
            return Ok(existing);
        }

        let order = Order::create(request, &self.catalog, idempotency_key)?;
        let unpriced = order.unpriced_items();
        if unpriced > 0 {
            tracing::warn!(
                order_id = %order.id,
                unpriced,
                "Order contains items that do not match the catalog"
            );
        }

        match self.store.insert(&order).await {
            Ok(()) => {}
            // Lost a race with a concurrent request using the same key.
            Err(RepositoryError::Conflict(_)) if order.idempotency_key.is_some() => {
                if let Some(key) = &order.idempotency_key
                    && let Some(existing) = self.store.find_by_idempotency_key(key).await?
                {
                    return Ok(existing);
                }
                return Err(RepositoryError::NotFound.into());
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            order_id = %order.id,
            items = order.items.len(),
            subtotal = %order.subtotal,
            "Order saved"
        );
        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wallposter_core::Price;
    use wallposter_core::order::{OrderItem, ShippingDetails};

    use super::*;

    const CATALOG: &str = r#"[{
        "id": 1, "title": "Monsoon", "artist": "R. Menon",
        "category": "Landscape", "orientation": "Portrait",
        "basePrice": 500, "addedAt": "2024-01-01",
        "variants": [{ "size": "A3", "price": 500 }]
    }]"#;

    fn service_with(catalog: &str) -> OrderService {
        let catalog = Catalog::from_json(catalog).unwrap();
        OrderService::new(OrderStore::memory(), Arc::new(catalog))
    }

    fn service() -> OrderService {
        service_with(CATALOG)
    }

    fn request(qty: u32) -> OrderRequest {
        OrderRequest {
            shipping: ShippingDetails {
                name: "Asha".to_string(),
                ..ShippingDetails::default()
            },
            items: vec![OrderItem {
                title: "Monsoon".to_string(),
                size: "A3".to_string(),
                qty,
                product_id: None,
            }],
        }
    }

    #[tokio::test]
    async fn test_place_prices_and_saves() {
        let service = service();
        let order = service.place(request(2), None).await.unwrap();
        assert_eq!(order.subtotal, Price::from_minor(1000));

        let saved = service.store().recent(10).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, order.id);
    }

    #[tokio::test]
    async fn test_orders_without_key_are_distinct() {
        let service = service();
        let first = service.place(request(1), None).await.unwrap();
        let second = service.place(request(1), None).await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_replayed_key_returns_original_order() {
        let service = service();
        let key = IdempotencyKey::parse("checkout-42").unwrap();

        let first = service.place(request(1), Some(key.clone())).await.unwrap();
        let second = service.place(request(5), Some(key)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.subtotal, Price::from_minor(500));
        assert_eq!(service.store().recent(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_overflowing_order_is_rejected_and_not_saved() {
        let service = service_with(&CATALOG.replace(
            r#""price": 500 }"#,
            r#""price": 4611686018427387904 }"#,
        ));

        let err = service.place(request(u32::MAX), None).await.unwrap_err();
        assert!(matches!(err, OrderServiceError::Invalid(OrderError::TotalOverflow)));
        assert!(service.store().recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recent_is_newest_first() {
        let service = service();
        let first = service.place(request(1), None).await.unwrap();
        let second = service.place(request(1), None).await.unwrap();

        let recent = service.store().recent(1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, second.id);
        assert_ne!(recent[0].id, first.id);
    }
}

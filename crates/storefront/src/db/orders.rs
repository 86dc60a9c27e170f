//! Order repository.
//!
//! Orders are written once and never updated. Shipping details and items
//! are stored as JSONB exactly as priced by the server.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use wallposter_core::order::{IdempotencyKey, Order, PricedItem, ShippingDetails};
use wallposter_core::{OrderId, Price};

use super::RepositoryError;

const ORDER_COLUMNS: &str = "id, shipping, items, subtotal, idempotency_key, created_at";

/// Raw `storefront.orders` row.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    shipping: Json<ShippingDetails>,
    items: Json<Vec<PricedItem>>,
    subtotal: i64,
    idempotency_key: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let idempotency_key = row
            .idempotency_key
            .as_deref()
            .map(IdempotencyKey::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid idempotency key in database: {e}"))
            })?;

        Ok(Self {
            id: OrderId::from_uuid(row.id),
            shipping: row.shipping.0,
            items: row.items.0,
            subtotal: Price::from_minor(row.subtotal),
            idempotency_key,
            created_at: row.created_at,
        })
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an order with the same
    /// idempotency key already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert(&self, order: &Order) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.orders
                (id, shipping, items, subtotal, idempotency_key, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(order.id.as_uuid())
        .bind(Json(&order.shipping))
        .bind(Json(&order.items))
        .bind(order.subtotal.minor_units())
        .bind(order.idempotency_key.as_ref().map(IdempotencyKey::as_str))
        .bind(order.created_at)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("idempotency key already used".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(())
    }

    /// Get an order by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.orders WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// Find the order created with an idempotency key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn find_by_idempotency_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.orders WHERE idempotency_key = $1"
        ))
        .bind(key.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// List the most recent orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn recent(&self, limit: i64) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.orders ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(idempotency_key: Option<&str>) -> OrderRow {
        OrderRow {
            id: Uuid::new_v4(),
            shipping: Json(ShippingDetails {
                name: "Asha".to_string(),
                ..ShippingDetails::default()
            }),
            items: Json(vec![PricedItem {
                title: "Monsoon".to_string(),
                size: "A3".to_string(),
                qty: 2,
                product_id: None,
                unit_price: Some(Price::from_minor(500)),
            }]),
            subtotal: 1000,
            idempotency_key: idempotency_key.map(String::from),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_converts_to_order() {
        let order = Order::try_from(row(Some("checkout-1"))).unwrap();
        assert_eq!(order.shipping.name, "Asha");
        assert_eq!(order.subtotal, Price::from_minor(1000));
        assert_eq!(order.idempotency_key.unwrap().as_str(), "checkout-1");
    }

    #[test]
    fn test_row_with_bad_key_is_corruption() {
        let err = Order::try_from(row(Some("has space"))).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }
}

//! Order inspection commands.

use wallposter_core::order::Order;
use wallposter_storefront::db::{self, OrderRepository, RepositoryError};

use super::{CommandError, database_url};

/// Errors from listing orders.
#[derive(Debug, thiserror::Error)]
pub enum OrdersError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Print the `limit` most recent orders, newest first.
pub async fn list(limit: i64) -> Result<(), OrdersError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to storefront database...");
    let pool = db::create_pool(&database_url).await?;

    let orders = OrderRepository::new(&pool).recent(limit.max(1)).await?;
    tracing::info!(count = orders.len(), "Loaded orders");

    #[allow(clippy::print_stdout)]
    {
        for order in &orders {
            println!("{}", format_order(order));
        }
    }
    Ok(())
}

fn format_order(order: &Order) -> String {
    let quantity: u32 = order.items.iter().map(|i| i.qty).sum();
    let unpriced = order.unpriced_items();
    let mut line = format!(
        "{}  {}  {:<24}  {:>3} items  {}",
        order.id,
        order.created_at.format("%Y-%m-%d %H:%M"),
        order.shipping.name,
        quantity,
        order.subtotal,
    );
    if unpriced > 0 {
        line.push_str(&format!("  ({unpriced} unpriced)"));
    }
    line
}

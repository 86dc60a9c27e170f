//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use wallposter_core::{Catalog, Price};

use crate::config::StorefrontConfig;
use crate::services::catalog::LoadedCatalog;
use crate::services::{
    OrderClient, OrderClientError, OrderService, OrderStore, OrderSubmitter,
};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the catalog, the order service and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: Option<PgPool>,
    catalog: Arc<Catalog>,
    catalog_error: Option<String>,
    orders: OrderService,
    submitter: OrderSubmitter,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool, if a database is configured
    /// * `catalog` - The catalog loaded at startup
    ///
    /// # Errors
    ///
    /// Returns an error if the remote order client cannot be built.
    pub fn new(
        config: StorefrontConfig,
        pool: Option<PgPool>,
        catalog: LoadedCatalog,
    ) -> Result<Self, OrderClientError> {
        let catalog_error = catalog.error.map(|e| e.to_string());
        let catalog = Arc::new(catalog.catalog);

        let store = pool
            .clone()
            .map_or_else(OrderStore::memory, OrderStore::Postgres);
        let orders = OrderService::new(store, Arc::clone(&catalog));

        let submitter = match &config.order_service_url {
            Some(url) => OrderSubmitter::Remote(OrderClient::new(url, config.order_timeout)?),
            None => OrderSubmitter::Local {
                service: orders.clone(),
                timeout: config.order_timeout,
            },
        };

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                catalog_error,
                orders,
                submitter,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the database connection pool, if one is configured.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Get the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Why the catalog is empty, if loading it failed.
    #[must_use]
    pub fn catalog_error(&self) -> Option<&str> {
        self.inner.catalog_error.as_deref()
    }

    /// Get the Order Service behind `POST /api/order`.
    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    /// Get the submitter checkout uses to place orders.
    #[must_use]
    pub fn submitter(&self) -> &OrderSubmitter {
        &self.inner.submitter
    }

    /// Flat shipping fee for a non-empty cart.
    #[must_use]
    pub fn shipping_fee(&self) -> Price {
        self.inner.config.shipping_fee
    }
}

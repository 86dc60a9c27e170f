//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. Errors render as `{ "error": "..." }` JSON;
//! server-side failures never expose their internal details.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use wallposter_core::cart::CartError;
use wallposter_core::order::{ErrorBody, ORDER_SAVE_FAILED_MESSAGE};

use crate::db::RepositoryError;
use crate::models::session::CartStorageError;
use crate::services::OrderServiceError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// An order could not be saved.
    #[error("Order not saved: {0}")]
    OrderNotSaved(#[from] OrderServiceError),

    /// The cart could not be written to the session.
    #[error("Cart storage error: {0}")]
    CartStorage(#[from] CartStorageError),

    /// A cart operation was refused.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Whether the failure is on the server side.
    const fn is_server_error(&self) -> bool {
        match self {
            Self::OrderNotSaved(OrderServiceError::Invalid(_))
            | Self::Cart(_)
            | Self::NotFound(_)
            | Self::BadRequest(_) => false,
            Self::Database(_) | Self::OrderNotSaved(_) | Self::CartStorage(_) => true,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::OrderNotSaved(OrderServiceError::Invalid(_))
            | Self::Cart(CartError::UnknownVariant { .. })
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::OrderNotSaved(_) | Self::CartStorage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Cart(CartError::LineNotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::OrderNotSaved(OrderServiceError::Invalid(err)) => err.to_string(),
            Self::OrderNotSaved(_) => ORDER_SAVE_FAILED_MESSAGE.to_string(),
            Self::Database(_) | Self::CartStorage(_) => "Internal server error".to_string(),
            Self::Cart(err) => err.to_string(),
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::BadRequest(reason) => reason.clone(),
        };

        (status, Json(ErrorBody::new(message))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}

//! Session-backed cart persistence.
//!
//! The visitor's session plays the role of browser storage: the cart is
//! stored as a snapshot under a versioned key and restored on every request.

use serde_json::Value;
use thiserror::Error;
use tower_sessions::Session;

use wallposter_core::cart::Cart;
use wallposter_core::cart::snapshot::{self, SnapshotError, SnapshotVersion};

/// Session keys.
pub mod keys {
    pub use wallposter_core::cart::snapshot::CART_STORAGE_KEY as CART;
}

/// Errors writing the cart to the session.
#[derive(Debug, Error)]
pub enum CartStorageError {
    #[error("session store error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Restore the cart from the session.
///
/// Snapshots in an older format are upgraded and rewritten under the current
/// key. A snapshot that cannot be read is dropped and the visitor starts
/// with an empty cart.
pub async fn load_cart(session: &Session) -> Cart {
    for version in SnapshotVersion::ALL {
        let key = version.storage_key();
        let value = match session.get::<Value>(key).await {
            Ok(Some(value)) => value,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(key, error = %e, "Could not read cart from session");
                return Cart::new();
            }
        };

        match snapshot::restore(version, value) {
            Ok(cart) => {
                if version != SnapshotVersion::CURRENT {
                    migrate(session, key, &cart).await;
                }
                return cart;
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding unreadable cart snapshot");
                if let Err(e) = session.remove_value(key).await {
                    tracing::warn!(key, error = %e, "Could not remove cart snapshot");
                }
            }
        }
    }

    Cart::new()
}

/// Write the cart to the session under the current key.
///
/// # Errors
///
/// Returns `CartStorageError` if the cart cannot be encoded or stored.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), CartStorageError> {
    let value = snapshot::encode(cart)?;
    session.insert(keys::CART, value).await?;
    Ok(())
}

/// Empty the stored cart.
///
/// # Errors
///
/// Returns `CartStorageError::Session` if the session store fails.
pub async fn clear_cart(session: &Session) -> Result<(), CartStorageError> {
    session.remove_value(keys::CART).await?;
    Ok(())
}

async fn migrate(session: &Session, old_key: &str, cart: &Cart) {
    match save_cart(session, cart).await {
        Ok(()) => {
            if let Err(e) = session.remove_value(old_key).await {
                tracing::warn!(key = old_key, error = %e, "Could not remove migrated cart");
            }
            tracing::info!(from = old_key, to = keys::CART, "Migrated cart snapshot");
        }
        Err(e) => tracing::warn!(error = %e, "Could not migrate cart snapshot"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_empty_session_is_empty_cart() {
        assert!(load_cart(&session()).await.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let session = session();
        session
            .insert(
                keys::CART,
                json!([{
                    "key": "1:A3", "id": 1, "title": "Monsoon",
                    "variant": { "size": "A3", "price": 500 },
                    "price": 500, "qty": 2
                }]),
            )
            .await
            .unwrap();

        let cart = load_cart(&session).await;
        assert_eq!(cart.item_count(), 2);

        save_cart(&session, &Cart::new()).await.unwrap();
        assert!(load_cart(&session).await.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_snapshot_is_discarded() {
        let session = session();
        session
            .insert(keys::CART, json!({ "not": "a cart" }))
            .await
            .unwrap();

        assert!(load_cart(&session).await.is_empty());
        assert!(session.get::<Value>(keys::CART).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_cart() {
        let session = session();
        session.insert(keys::CART, json!([])).await.unwrap();
        clear_cart(&session).await.unwrap();
        assert!(session.get::<Value>(keys::CART).await.unwrap().is_none());
    }
}

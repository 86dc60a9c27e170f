//! Persisted cart snapshots.
//!
//! A snapshot is the JSON array of [`CartLine`]s stored under a versioned
//! key (`cart.v1`). The in-memory [`Cart`] is the source of truth; the
//! snapshot is a best-effort mirror written after every mutation.
//!
//! Restoring goes through [`restore`], which knows how to read every
//! version in [`SnapshotVersion::ALL`] and upgrades it to the current line
//! shape. A snapshot that cannot be read is reported so the caller can
//! discard it.

use serde_json::Value;
use thiserror::Error;

use super::{Cart, CartLine};

/// Errors reading or writing a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The stored value does not match the schema for its version.
    #[error("cart snapshot {key} is unreadable: {source}")]
    Unreadable {
        /// Storage key the value was read from.
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The cart could not be converted to JSON.
    #[error("cart snapshot could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Known snapshot schema versions, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotVersion {
    V1,
}

impl SnapshotVersion {
    /// The version new snapshots are written in.
    pub const CURRENT: Self = Self::V1;

    /// Every readable version, newest first.
    pub const ALL: [Self; 1] = [Self::V1];

    /// Storage key for this version.
    #[must_use]
    pub const fn storage_key(&self) -> &'static str {
        match self {
            Self::V1 => "cart.v1",
        }
    }
}

/// Storage key for the current snapshot version.
pub const CART_STORAGE_KEY: &str = SnapshotVersion::CURRENT.storage_key();

/// Encode a cart in the current snapshot format.
///
/// # Errors
///
/// Returns `SnapshotError::Encode` if serialization fails.
pub fn encode(cart: &Cart) -> Result<Value, SnapshotError> {
    serde_json::to_value(cart.lines()).map_err(SnapshotError::Encode)
}

/// Decode a stored snapshot of the given version into a cart.
///
/// Older versions are migrated to the current line shape; the result is
/// passed through [`Cart::from_lines`] so key uniqueness and the quantity
/// floor hold even for hand-edited or corrupted data.
///
/// # Errors
///
/// Returns `SnapshotError::Unreadable` if the value does not match the
/// version's schema.
pub fn restore(version: SnapshotVersion, value: Value) -> Result<Cart, SnapshotError> {
    let lines = match version {
        SnapshotVersion::V1 => serde_json::from_value::<Vec<CartLine>>(value),
    }
    .map_err(|source| SnapshotError::Unreadable {
        key: version.storage_key(),
        source,
    })?;

    Ok(Cart::from_lines(lines))
}

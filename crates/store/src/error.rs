//! Error taxonomy for the cart engine.
//!
//! No error here is fatal: validation and guard failures are rejected
//! without partial state changes, persistence failures degrade to
//! memory-only operation, and corrupt stored data is dropped per entry.

use thiserror::Error;

/// Rejection reasons for cart store operations.
///
/// Guard failures are deliberately distinguishable so user messaging can be
/// specific about why a mutation was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The region key has an empty province or city segment.
    #[error("invalid region key: {0:?}")]
    InvalidRegionKey(String),

    /// A zero quantity was passed where at least one unit is required.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// The partition already holds the maximum number of distinct products.
    #[error("partition already holds {limit} distinct products")]
    CapacityExceeded {
        /// The distinct-product cap that was hit.
        limit: usize,
    },

    /// An increase would exceed the known stock count.
    #[error("requested quantity exceeds known stock of {stock}")]
    StockInsufficient {
        /// Stock count captured in the product snapshot.
        stock: u32,
    },

    /// The item is already at the maximum quantity.
    #[error("quantity is already at the maximum")]
    MaxQuantityReached,

    /// The item is already at the minimum quantity.
    #[error("quantity is already at the minimum")]
    MinQuantityReached,

    /// The captured product snapshot is off sale or sold out.
    #[error("product is no longer purchasable")]
    OffShelf,

    /// No item with the given product id exists in the partition.
    #[error("product not found in this partition")]
    ItemNotFound,
}

/// Failures reported by a [`StorageSlot`](crate::storage::StorageSlot)
/// implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The backing store refused the write for capacity reasons.
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// Any other backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Failures surfaced by the persistence adapter's `save`.
///
/// A `save` error means the durable copy now lags the in-memory cart; the
/// in-memory cart remains authoritative and usable.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The cart could not be serialized.
    #[error("failed to serialize cart: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The write stayed over quota even after pruning stale items.
    #[error("storage quota exhausted even after pruning stale items")]
    QuotaExhausted,

    /// Any other backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Errors raised while loading [`StoreConfig`](crate::config::StoreConfig)
/// from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable was present but could not be parsed.
    #[error("invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

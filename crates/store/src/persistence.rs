//! Whole-cart persistence over a single durable slot.
//!
//! The adapter only (de)serializes on the store's behalf; it never owns the
//! cart. `load` is infallible by design: a missing, malformed, or
//! structurally invalid blob degrades to an empty cart, and individually
//! corrupt entries are dropped while the rest of the blob is kept. `save`
//! re-serializes the complete current state on every call, so the latest
//! write always wins and no merge is ever needed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use regional_cart_core::{CartItem, MAX_QUANTITY, MIN_QUANTITY, RegionKey};
use tracing::{debug, warn};

use crate::error::{PersistenceError, StorageError};
use crate::storage::StorageSlot;

/// The full cart: region key to ordered item list. An absent key and a
/// present-but-empty list both mean "no items".
pub type PartitionedCart = HashMap<RegionKey, Vec<CartItem>>;

/// Loads and saves the partitioned cart through one [`StorageSlot`].
pub struct PersistenceAdapter {
    slot: Box<dyn StorageSlot>,
    retention: chrono::Duration,
}

impl PersistenceAdapter {
    /// Create an adapter over the given slot.
    ///
    /// `retention` bounds how old an item may be before it is pruned when a
    /// write fails on quota.
    #[must_use]
    pub fn new(slot: Box<dyn StorageSlot>, retention: chrono::Duration) -> Self {
        Self { slot, retention }
    }

    /// Load the cart from the slot. Never fails.
    ///
    /// Per-entry validation: partitions under un-decodable region keys are
    /// dropped, as are items that fail to decode, carry an empty product id,
    /// or hold a quantity below the minimum. Quantities above the maximum
    /// are clamped. Duplicate product ids within a partition keep their
    /// first occurrence.
    #[must_use]
    pub fn load(&self) -> PartitionedCart {
        let raw = match self.slot.read() {
            Ok(Some(raw)) => raw,
            Ok(None) => return HashMap::new(),
            Err(e) => {
                warn!("failed to read cart slot, starting empty: {e}");
                return HashMap::new();
            }
        };

        let value: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("cart blob is not valid JSON, starting empty: {e}");
                return HashMap::new();
            }
        };

        let Some(object) = value.as_object() else {
            warn!("cart blob is not an object, starting empty");
            return HashMap::new();
        };

        let mut cart = HashMap::new();
        for (key, partition_value) in object {
            let region = match key.parse::<RegionKey>() {
                Ok(region) => region,
                Err(e) => {
                    warn!(%key, "dropping partition with malformed region key: {e}");
                    continue;
                }
            };

            let Some(raw_items) = partition_value.as_array() else {
                warn!(%key, "dropping partition whose value is not a list");
                continue;
            };

            let mut items: Vec<CartItem> = Vec::with_capacity(raw_items.len());
            for raw_item in raw_items {
                match serde_json::from_value::<CartItem>(raw_item.clone()) {
                    Ok(mut item) => {
                        if item.product.id.is_empty() || item.quantity < MIN_QUANTITY {
                            debug!(%key, "dropping cart item with empty id or zero quantity");
                            continue;
                        }
                        if item.quantity > MAX_QUANTITY {
                            item.quantity = MAX_QUANTITY;
                        }
                        if items.iter().any(|kept| kept.product.id == item.product.id) {
                            debug!(%key, id = %item.product.id, "dropping duplicate cart item");
                            continue;
                        }
                        items.push(item);
                    }
                    Err(e) => {
                        debug!(%key, "dropping undecodable cart item: {e}");
                    }
                }
            }

            if !items.is_empty() {
                cart.insert(region, items);
            }
        }

        cart
    }

    /// Serialize the full cart and write it atomically to the slot.
    ///
    /// On a quota failure, items older than the retention window are pruned
    /// across all partitions and the write retried once. The caller treats
    /// an error as "durable copy lags memory"; the in-memory cart stays
    /// authoritative either way.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::QuotaExhausted`] if the retry also stays
    /// over quota, [`PersistenceError::Backend`] for other write failures.
    pub fn save(&self, cart: &PartitionedCart) -> Result<(), PersistenceError> {
        let payload = serde_json::to_string(cart)?;
        match self.slot.write(&payload) {
            Ok(()) => Ok(()),
            Err(StorageError::QuotaExceeded) => {
                warn!(
                    retention_days = self.retention.num_days(),
                    "storage quota exceeded, pruning stale cart items and retrying"
                );
                let pruned = prune_stale(cart, Utc::now(), self.retention);
                let payload = serde_json::to_string(&pruned)?;
                self.slot.write(&payload).map_err(|e| match e {
                    StorageError::QuotaExceeded => PersistenceError::QuotaExhausted,
                    StorageError::Backend(message) => PersistenceError::Backend(message),
                })
            }
            Err(StorageError::Backend(message)) => Err(PersistenceError::Backend(message)),
        }
    }
}

/// Drop items whose `added_at` is older than the retention window, and
/// partitions left empty by that.
fn prune_stale(
    cart: &PartitionedCart,
    now: DateTime<Utc>,
    retention: chrono::Duration,
) -> PartitionedCart {
    cart.iter()
        .filter_map(|(region, items)| {
            let kept: Vec<CartItem> = items
                .iter()
                .filter(|item| now - item.added_at < retention)
                .cloned()
                .collect();
            (!kept.is_empty()).then(|| (region.clone(), kept))
        })
        .collect()
}

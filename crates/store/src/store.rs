//! The partitioned cart store.
//!
//! [`CartStore`] exclusively owns the in-memory cart. Every mutating
//! operation updates the map, bumps the touched partition's revision, and
//! then writes the complete cart through the persistence adapter; the
//! durable copy is never more than one completed operation behind memory.
//! A failed durable write degrades to memory-only operation and is surfaced
//! as [`CartEvent::PersistenceDegraded`].
//!
//! Public entrypoints are serialized behind a mutex, which is what makes the
//! debouncer's delayed callbacks safe to run from timer tasks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use moka::sync::Cache;
use regional_cart_core::{
    CartItem, CartStats, MAX_PARTITION_PRODUCTS, Product, ProductId, RegionKey, calculate_stats,
    clamp_quantity, guards,
};
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::CartError;
use crate::events::{CartEvent, SubscriptionId, Subscribers};
use crate::persistence::{PartitionedCart, PersistenceAdapter};
use crate::region::RegionProvider;
use crate::storage::StorageSlot;

/// How many (partition, revision) stats entries the memo cache keeps.
const STATS_CACHE_CAPACITY: u64 = 64;

struct StoreState {
    cart: PartitionedCart,
    /// Monotonic per-partition revision, bumped on every mutation of that
    /// partition. Stats are memoized on (key, revision), so recomputation
    /// only happens when the partition actually changed.
    revisions: HashMap<RegionKey, u64>,
}

impl StoreState {
    fn revision(&self, key: &RegionKey) -> u64 {
        self.revisions.get(key).copied().unwrap_or(0)
    }

    fn bump_revision(&mut self, key: &RegionKey) {
        *self.revisions.entry(key.clone()).or_insert(0) += 1;
    }
}

/// The regional cart state engine.
pub struct CartStore {
    state: Mutex<StoreState>,
    persistence: PersistenceAdapter,
    stats_cache: Cache<(String, u64), CartStats>,
    subscribers: Subscribers,
    region: Arc<dyn RegionProvider>,
}

impl CartStore {
    /// Build the store, loading the cart once from the durable slot.
    #[must_use]
    pub fn new(
        config: &StoreConfig,
        slot: Box<dyn StorageSlot>,
        region: Arc<dyn RegionProvider>,
    ) -> Self {
        let persistence = PersistenceAdapter::new(slot, config.retention());
        let cart = persistence.load();
        debug!(partitions = cart.len(), "cart loaded from durable slot");

        Self {
            state: Mutex::new(StoreState {
                cart,
                revisions: HashMap::new(),
            }),
            persistence,
            stats_cache: Cache::new(STATS_CACHE_CAPACITY),
            subscribers: Subscribers::new(),
            region,
        }
    }

    // =========================================================================
    // Subscription
    // =========================================================================

    /// Register a callback invoked with every [`CartEvent`].
    pub fn subscribe(
        &self,
        callback: impl Fn(&CartEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    /// Remove a subscription. Returns true if it existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Items in the given partition. Empty if the partition is absent.
    #[must_use]
    pub fn items_in(&self, key: &RegionKey) -> Vec<CartItem> {
        self.lock_state().cart.get(key).cloned().unwrap_or_default()
    }

    /// Derived stats for the given partition, memoized per revision.
    #[must_use]
    pub fn stats_in(&self, key: &RegionKey) -> CartStats {
        let (revision, items) = {
            let state = self.lock_state();
            (
                state.revision(key),
                state.cart.get(key).cloned().unwrap_or_default(),
            )
        };
        self.stats_cache
            .get_with((key.to_string(), revision), move || {
                calculate_stats(&items)
            })
    }

    /// Sum of distinct-product counts across every partition, for badge
    /// display.
    #[must_use]
    pub fn cross_partition_item_count(&self) -> usize {
        self.lock_state().cart.values().map(Vec::len).sum()
    }

    /// Sum of all quantities across every partition.
    #[must_use]
    pub fn cross_partition_total_quantity(&self) -> u64 {
        self.lock_state()
            .cart
            .values()
            .flatten()
            .map(|item| u64::from(item.quantity))
            .sum()
    }

    // =========================================================================
    // Mutations (keyed)
    // =========================================================================

    /// Add a product to a partition.
    ///
    /// If the product id is already present its quantity is merged up,
    /// clamped at the maximum (excess dropped). A new product in a partition
    /// already at the distinct-product cap is rejected without mutation.
    ///
    /// # Errors
    ///
    /// [`CartError::InvalidRegionKey`], [`CartError::InvalidQuantity`], or
    /// [`CartError::CapacityExceeded`].
    pub fn add_item_in(
        &self,
        key: &RegionKey,
        product: Product,
        quantity: u32,
    ) -> Result<(), CartError> {
        self.check_key(key)?;
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let product_id = product.id.clone();
        let event = {
            let mut state = self.lock_state();
            let items = state.cart.entry(key.clone()).or_default();

            if let Some(existing) = items.iter_mut().find(|item| item.product.id == product_id) {
                existing.quantity = clamp_quantity(existing.quantity.saturating_add(quantity));
                let merged = existing.quantity;
                state.bump_revision(key);
                CartEvent::Added {
                    region: key.clone(),
                    product_id,
                    quantity: merged,
                }
            } else if items.len() >= MAX_PARTITION_PRODUCTS {
                drop(state);
                self.subscribers.notify(&CartEvent::CapacityFull {
                    region: key.clone(),
                    limit: MAX_PARTITION_PRODUCTS,
                });
                return Err(CartError::CapacityExceeded {
                    limit: MAX_PARTITION_PRODUCTS,
                });
            } else {
                let quantity = clamp_quantity(quantity);
                items.push(CartItem::new(product, quantity));
                state.bump_revision(key);
                CartEvent::Added {
                    region: key.clone(),
                    product_id,
                    quantity,
                }
            }
        };

        self.persist();
        self.subscribers.notify(&event);
        Ok(())
    }

    /// Remove a product from a partition. No-op if absent.
    ///
    /// # Errors
    ///
    /// [`CartError::InvalidRegionKey`].
    pub fn remove_item_in(&self, key: &RegionKey, product_id: &ProductId) -> Result<(), CartError> {
        self.check_key(key)?;

        let removed = {
            let mut state = self.lock_state();
            let Some(items) = state.cart.get_mut(key) else {
                return Ok(());
            };
            let before = items.len();
            items.retain(|item| item.product.id != *product_id);
            let removed = items.len() != before;
            if removed {
                state.bump_revision(key);
            }
            removed
        };

        if removed {
            self.persist();
            self.subscribers.notify(&CartEvent::Removed {
                region: key.clone(),
                product_id: product_id.clone(),
            });
        }
        Ok(())
    }

    /// Set a product's quantity in place. Zero delegates to removal; other
    /// values are clamped into the permitted range. No-op if absent.
    ///
    /// # Errors
    ///
    /// [`CartError::InvalidRegionKey`].
    pub fn set_quantity_in(
        &self,
        key: &RegionKey,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CartError> {
        self.check_key(key)?;
        if quantity == 0 {
            return self.remove_item_in(key, product_id);
        }

        let updated = {
            let mut state = self.lock_state();
            let Some(items) = state.cart.get_mut(key) else {
                return Ok(());
            };
            let Some(item) = items.iter_mut().find(|item| item.product.id == *product_id)
            else {
                return Ok(());
            };
            item.quantity = clamp_quantity(quantity);
            let updated = item.quantity;
            state.bump_revision(key);
            updated
        };

        self.persist();
        self.subscribers.notify(&CartEvent::QuantityChanged {
            region: key.clone(),
            product_id: product_id.clone(),
            quantity: updated,
        });
        Ok(())
    }

    /// Grow a product's quantity by one, guard-checked.
    ///
    /// Returns the new quantity.
    ///
    /// # Errors
    ///
    /// [`CartError::ItemNotFound`], [`CartError::OffShelf`],
    /// [`CartError::MaxQuantityReached`], or
    /// [`CartError::StockInsufficient`] - each refusal leaves the item
    /// untouched and is surfaced as the matching event where one exists.
    pub fn increase_quantity_in(
        &self,
        key: &RegionKey,
        product_id: &ProductId,
    ) -> Result<u32, CartError> {
        self.check_key(key)?;

        let outcome = {
            let mut state = self.lock_state();
            let Some(items) = state.cart.get_mut(key) else {
                return Err(CartError::ItemNotFound);
            };
            let Some(item) = items.iter_mut().find(|item| item.product.id == *product_id)
            else {
                return Err(CartError::ItemNotFound);
            };

            if guards::is_off_shelf(item) {
                Err((
                    CartError::OffShelf,
                    Some(CartEvent::OffShelfBlocked {
                        region: key.clone(),
                        product_id: product_id.clone(),
                    }),
                ))
            } else if guards::can_increase(item) {
                item.quantity += 1;
                let quantity = item.quantity;
                state.bump_revision(key);
                Ok(quantity)
            } else if let Some(stock) = item.product.stock
                && item.quantity >= stock
            {
                Err((
                    CartError::StockInsufficient { stock },
                    Some(CartEvent::StockInsufficient {
                        region: key.clone(),
                        product_id: product_id.clone(),
                        stock,
                    }),
                ))
            } else {
                Err((CartError::MaxQuantityReached, None))
            }
        };

        match outcome {
            Ok(quantity) => {
                self.persist();
                self.subscribers.notify(&CartEvent::QuantityChanged {
                    region: key.clone(),
                    product_id: product_id.clone(),
                    quantity,
                });
                Ok(quantity)
            }
            Err((error, event)) => {
                if let Some(event) = event {
                    self.subscribers.notify(&event);
                }
                Err(error)
            }
        }
    }

    /// Shrink a product's quantity by one, guard-checked.
    ///
    /// Returns the new quantity.
    ///
    /// # Errors
    ///
    /// [`CartError::ItemNotFound`] or [`CartError::MinQuantityReached`];
    /// refusals leave the item untouched.
    pub fn decrease_quantity_in(
        &self,
        key: &RegionKey,
        product_id: &ProductId,
    ) -> Result<u32, CartError> {
        self.check_key(key)?;

        let quantity = {
            let mut state = self.lock_state();
            let Some(items) = state.cart.get_mut(key) else {
                return Err(CartError::ItemNotFound);
            };
            let Some(item) = items.iter_mut().find(|item| item.product.id == *product_id)
            else {
                return Err(CartError::ItemNotFound);
            };

            if !guards::can_decrease(item) {
                return Err(CartError::MinQuantityReached);
            }
            item.quantity -= 1;
            let quantity = item.quantity;
            state.bump_revision(key);
            quantity
        };

        self.persist();
        self.subscribers.notify(&CartEvent::QuantityChanged {
            region: key.clone(),
            product_id: product_id.clone(),
            quantity,
        });
        Ok(quantity)
    }

    /// Empty one partition.
    ///
    /// # Errors
    ///
    /// [`CartError::InvalidRegionKey`].
    pub fn clear_partition_in(&self, key: &RegionKey) -> Result<(), CartError> {
        self.check_key(key)?;

        {
            let mut state = self.lock_state();
            state.cart.insert(key.clone(), Vec::new());
            state.bump_revision(key);
        }

        self.persist();
        self.subscribers
            .notify(&CartEvent::PartitionCleared { region: key.clone() });
        Ok(())
    }

    /// Empty every partition.
    pub fn clear_all(&self) {
        {
            let mut state = self.lock_state();
            let keys: Vec<RegionKey> = state.cart.keys().cloned().collect();
            state.cart.clear();
            for key in &keys {
                state.bump_revision(key);
            }
        }

        self.persist();
        self.subscribers.notify(&CartEvent::AllCleared);
    }

    // =========================================================================
    // Current-region conveniences
    // =========================================================================

    /// The active region key, derived fresh from the provider.
    #[must_use]
    pub fn current_region(&self) -> RegionKey {
        self.region.current()
    }

    /// Items in the active region's partition.
    #[must_use]
    pub fn current_items(&self) -> Vec<CartItem> {
        self.items_in(&self.current_region())
    }

    /// Stats for the active region's partition.
    #[must_use]
    pub fn current_stats(&self) -> CartStats {
        self.stats_in(&self.current_region())
    }

    /// Add to the active region's partition.
    ///
    /// # Errors
    ///
    /// As [`CartStore::add_item_in`].
    pub fn add_to_current(&self, product: Product, quantity: u32) -> Result<(), CartError> {
        self.add_item_in(&self.current_region(), product, quantity)
    }

    /// Remove from the active region's partition.
    ///
    /// # Errors
    ///
    /// As [`CartStore::remove_item_in`].
    pub fn remove_from_current(&self, product_id: &ProductId) -> Result<(), CartError> {
        self.remove_item_in(&self.current_region(), product_id)
    }

    /// Set a quantity in the active region's partition.
    ///
    /// # Errors
    ///
    /// As [`CartStore::set_quantity_in`].
    pub fn set_current_quantity(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CartError> {
        self.set_quantity_in(&self.current_region(), product_id, quantity)
    }

    /// Empty the active region's partition.
    ///
    /// # Errors
    ///
    /// As [`CartStore::clear_partition_in`].
    pub fn clear_current(&self) -> Result<(), CartError> {
        self.clear_partition_in(&self.current_region())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn check_key(&self, key: &RegionKey) -> Result<(), CartError> {
        if key.is_valid() {
            Ok(())
        } else {
            Err(CartError::InvalidRegionKey(key.to_string()))
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Write-through: serialize the complete current state into the slot.
    /// A failure degrades to memory-only operation.
    fn persist(&self) {
        let snapshot = self.lock_state().cart.clone();
        if let Err(e) = self.persistence.save(&snapshot) {
            warn!("cart persistence degraded, in-memory state remains authoritative: {e}");
            self.subscribers.notify(&CartEvent::PersistenceDegraded);
        }
    }
}

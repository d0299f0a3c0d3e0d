//! Typed outcome events for presentation layers.
//!
//! The engine renders nothing. Subscribers receive a [`CartEvent`] after
//! each operation (successful or refused) and turn it into toasts, badges,
//! or whatever the embedding UI wants. Callbacks run synchronously on the
//! mutating call, after the store's own state lock has been released.

use std::sync::{
    Mutex,
    atomic::{AtomicU64, Ordering},
};

use regional_cart_core::{ProductId, RegionKey};

/// Outcome of a cart operation, for user-facing messaging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    /// An item was added (or its quantity merged up) in a partition.
    Added {
        region: RegionKey,
        product_id: ProductId,
        /// Quantity after the add.
        quantity: u32,
    },
    /// An item was removed from a partition.
    Removed {
        region: RegionKey,
        product_id: ProductId,
    },
    /// An item's quantity changed in place.
    QuantityChanged {
        region: RegionKey,
        product_id: ProductId,
        /// Quantity after the change.
        quantity: u32,
    },
    /// An add was refused because the partition is at its distinct-product cap.
    CapacityFull { region: RegionKey, limit: usize },
    /// An increase was refused because it would exceed known stock.
    StockInsufficient {
        region: RegionKey,
        product_id: ProductId,
        stock: u32,
    },
    /// A quantity edit was refused because the item went off shelf.
    OffShelfBlocked {
        region: RegionKey,
        product_id: ProductId,
    },
    /// A partition was emptied.
    PartitionCleared { region: RegionKey },
    /// Every partition was emptied.
    AllCleared,
    /// The durable write failed; the persisted copy now lags memory.
    PersistenceDegraded,
}

/// Handle identifying one subscription, for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = std::sync::Arc<dyn Fn(&CartEvent) + Send + Sync>;

/// Registry of event subscribers.
pub(crate) struct Subscribers {
    next_id: AtomicU64,
    callbacks: Mutex<Vec<(SubscriptionId, Callback)>>,
}

impl Subscribers {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            callbacks: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn subscribe(
        &self,
        callback: impl Fn(&CartEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let entry = (id, std::sync::Arc::new(callback) as Callback);
        match self.callbacks.lock() {
            Ok(mut guard) => guard.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
        id
    }

    /// Returns true if the subscription existed.
    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut guard = match self.callbacks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = guard.len();
        guard.retain(|(existing, _)| *existing != id);
        guard.len() != before
    }

    /// Invoke every subscriber with the event.
    ///
    /// The callback list is snapshotted first so a callback may subscribe
    /// or unsubscribe without deadlocking.
    pub(crate) fn notify(&self, event: &CartEvent) {
        let snapshot: Vec<Callback> = {
            let guard = match self.callbacks.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.iter().map(|(_, cb)| cb.clone()).collect()
        };
        for callback in snapshot {
            callback(event);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn test_subscribe_notify_unsubscribe() {
        let subscribers = Subscribers::new();
        let seen = Arc::new(AtomicUsize::new(0));

        let seen_clone = seen.clone();
        let id = subscribers.subscribe(move |_| {
            seen_clone.fetch_add(1, Ordering::Relaxed);
        });

        subscribers.notify(&CartEvent::AllCleared);
        assert_eq!(seen.load(Ordering::Relaxed), 1);

        assert!(subscribers.unsubscribe(id));
        subscribers.notify(&CartEvent::AllCleared);
        assert_eq!(seen.load(Ordering::Relaxed), 1);

        assert!(!subscribers.unsubscribe(id));
    }

    #[test]
    fn test_events_carry_context() {
        let event = CartEvent::StockInsufficient {
            region: RegionKey::new("江苏省", "南京市"),
            product_id: ProductId::new("p-1"),
            stock: 10,
        };
        match event {
            CartEvent::StockInsufficient { stock, .. } => assert_eq!(stock, 10),
            other => panic!("unexpected event {other:?}"),
        }
    }
}

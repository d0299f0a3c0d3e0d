//! Integration tests for the regional cart engine.
//!
//! Exercises the whole stack - store, guards, stats, persistence, debounce -
//! through the public API only, the way an embedding UI would.
//!
//! # Test Categories
//!
//! - `scenarios` - end-to-end flows (stock guard, capacity cap, quota prune)
//! - `invariants` - property-based operation-sequence checks
//! - `debounce` - timer collapse and teardown behavior

#![cfg_attr(not(test), forbid(unsafe_code))]


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod scenarios {
    use std::sync::{Arc, Mutex};

    use chrono::{Duration, Utc};
    use regional_cart_core::{CartItem, MAX_PARTITION_PRODUCTS, ProductId, RegionKey};
    use regional_cart_store::{
        CartError, CartEvent, CartStore, MemorySlot, PartitionedCart, PersistenceAdapter,
        StaticRegionProvider, StoreConfig,
    };
    use rust_decimal::Decimal;

    use crate::helpers::{fresh_store, nanjing, product, shenzhen};

    /// End-to-end flow: add once, step the quantity up, hit the stock
    /// ceiling and get a specific refusal.
    #[test]
    fn stock_guard_scenario() {
        let (store, _provider) = fresh_store();
        let id = ProductId::new("p-1");

        store
            .add_item_in(&nanjing(), product("p-1", 500, Some(10)), 1)
            .unwrap();
        let stats = store.stats_in(&nanjing());
        assert_eq!(stats.item_count, 1);
        assert_eq!(stats.total_items, 1);
        assert_eq!(stats.total_amount, Decimal::new(500, 2));

        for _ in 0..3 {
            store.increase_quantity_in(&nanjing(), &id).unwrap();
        }
        assert_eq!(store.items_in(&nanjing()).first().unwrap().quantity, 4);
        assert_eq!(store.stats_in(&nanjing()).total_amount, Decimal::new(2000, 2));

        // Walk up to the stock ceiling, then get refused with a reason.
        while store.items_in(&nanjing()).first().unwrap().quantity < 10 {
            store.increase_quantity_in(&nanjing(), &id).unwrap();
        }
        assert_eq!(
            store.increase_quantity_in(&nanjing(), &id),
            Err(CartError::StockInsufficient { stock: 10 })
        );
        assert_eq!(store.items_in(&nanjing()).first().unwrap().quantity, 10);
    }

    #[test]
    fn capacity_cap_scenario() {
        let (store, _provider) = fresh_store();

        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        store.subscribe(move |event| {
            if matches!(event, CartEvent::CapacityFull { .. }) {
                events_clone.lock().unwrap().push(event.clone());
            }
        });

        for index in 0..MAX_PARTITION_PRODUCTS {
            store
                .add_item_in(&nanjing(), product(&format!("p-{index}"), 100, None), 1)
                .unwrap();
        }

        assert_eq!(
            store.add_item_in(&nanjing(), product("p-overflow", 100, None), 1),
            Err(CartError::CapacityExceeded {
                limit: MAX_PARTITION_PRODUCTS
            })
        );
        assert_eq!(store.items_in(&nanjing()).len(), MAX_PARTITION_PRODUCTS);
        assert_eq!(events.lock().unwrap().len(), 1);

        // A different partition is unaffected by the cap.
        store
            .add_item_in(&shenzhen(), product("p-elsewhere", 100, None), 1)
            .unwrap();
        assert_eq!(
            store.cross_partition_item_count(),
            MAX_PARTITION_PRODUCTS + 1
        );
    }

    /// Quota failure prunes stale items, retries once, and afterwards only
    /// genuinely stale entries differ between memory and the durable copy.
    #[test]
    fn quota_prune_scenario() {
        let now = Utc::now();
        let mut fresh = CartItem::new(product("p-fresh", 500, None), 2);
        // Truncate to millisecond precision so the durable round trip
        // compares equal.
        fresh.added_at = chrono::DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap();
        let mut stale = CartItem::new(product("p-stale", 500, None), 1);
        stale.added_at = now - Duration::days(10);

        let mut cart = PartitionedCart::new();
        cart.insert(nanjing(), vec![fresh.clone(), stale]);

        let mut expected_durable = PartitionedCart::new();
        expected_durable.insert(nanjing(), vec![fresh]);

        let full_len = serde_json::to_string(&cart).unwrap().len();
        let pruned_len = serde_json::to_string(&expected_durable).unwrap().len();
        let quota = (full_len + pruned_len) / 2;

        let adapter = PersistenceAdapter::new(
            Box::new(MemorySlot::with_quota(quota)),
            Duration::days(7),
        );
        adapter.save(&cart).unwrap();

        assert_eq!(adapter.load(), expected_durable);
    }

    /// A cart persisted by one process is visible to the next, and the
    /// region switch changes which partition the UI sees.
    #[test]
    fn reload_and_region_switch_scenario() {
        let config = StoreConfig::default();
        let provider = Arc::new(StaticRegionProvider::new(nanjing()));

        let blob = {
            let store = CartStore::new(
                &config,
                Box::new(MemorySlot::new()),
                provider.clone(),
            );
            store.add_to_current(product("p-1", 500, None), 2).unwrap();
            provider.set(shenzhen());
            store.add_to_current(product("p-2", 300, None), 1).unwrap();
            serde_json::json!({
                "江苏省-南京市": store.items_in(&nanjing()),
                "广东省-深圳市": store.items_in(&shenzhen()),
            })
            .to_string()
        };

        let provider = Arc::new(StaticRegionProvider::new(nanjing()));
        let store = CartStore::new(
            &config,
            Box::new(MemorySlot::with_value(blob)),
            provider.clone(),
        );

        assert_eq!(store.current_items().len(), 1);
        assert_eq!(store.current_stats().total_amount, Decimal::new(1000, 2));

        provider.set(shenzhen());
        assert_eq!(store.current_stats().total_amount, Decimal::new(300, 2));
        assert_eq!(store.cross_partition_item_count(), 2);
    }

    /// Absent and explicitly emptied partitions read identically.
    #[test]
    fn absent_and_emptied_partitions_match() {
        let (store, _provider) = fresh_store();
        let untouched = RegionKey::new("云南省", "昆明市");

        store.add_item_in(&nanjing(), product("p-1", 500, None), 1).unwrap();
        store.clear_partition_in(&nanjing()).unwrap();

        assert_eq!(store.items_in(&nanjing()), store.items_in(&untouched));
        assert_eq!(store.stats_in(&nanjing()), store.stats_in(&untouched));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod invariants {
    use proptest::prelude::*;
    use regional_cart_core::{MAX_PARTITION_PRODUCTS, MAX_QUANTITY, MIN_QUANTITY, ProductId};

    use crate::helpers::{fresh_store, nanjing, product};

    #[derive(Debug, Clone)]
    enum Op {
        Add(u8, u32),
        Remove(u8),
        Set(u8, u32),
        Increase(u8),
        Decrease(u8),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..8, 0u32..1500).prop_map(|(id, qty)| Op::Add(id, qty)),
            (0u8..8).prop_map(Op::Remove),
            (0u8..8, 0u32..1500).prop_map(|(id, qty)| Op::Set(id, qty)),
            (0u8..8).prop_map(Op::Increase),
            (0u8..8).prop_map(Op::Decrease),
        ]
    }

    proptest! {
        /// After any operation sequence every surviving item holds a legal
        /// quantity, product ids stay unique, and the partition respects the
        /// distinct-product cap.
        #[test]
        fn prop_quantity_and_uniqueness_invariants(ops in proptest::collection::vec(arb_op(), 1..60)) {
            let (store, _provider) = fresh_store();
            let key = nanjing();

            for op in ops {
                match op {
                    Op::Add(id, qty) => {
                        let _ = store.add_item_in(&key, product(&format!("p-{id}"), 250, None), qty);
                    }
                    Op::Remove(id) => {
                        let _ = store.remove_item_in(&key, &ProductId::new(format!("p-{id}")));
                    }
                    Op::Set(id, qty) => {
                        let _ = store.set_quantity_in(&key, &ProductId::new(format!("p-{id}")), qty);
                    }
                    Op::Increase(id) => {
                        let _ = store.increase_quantity_in(&key, &ProductId::new(format!("p-{id}")));
                    }
                    Op::Decrease(id) => {
                        let _ = store.decrease_quantity_in(&key, &ProductId::new(format!("p-{id}")));
                    }
                }

                let items = store.items_in(&key);
                prop_assert!(items.len() <= MAX_PARTITION_PRODUCTS);
                for item in &items {
                    prop_assert!(item.quantity >= MIN_QUANTITY);
                    prop_assert!(item.quantity <= MAX_QUANTITY);
                }
                let mut ids: Vec<&str> = items.iter().map(|i| i.product.id.as_str()).collect();
                ids.sort_unstable();
                ids.dedup();
                prop_assert_eq!(ids.len(), items.len());
            }
        }

        /// Stats always match a from-scratch recomputation of the item list.
        #[test]
        fn prop_stats_recomputable(adds in proptest::collection::vec((0u8..8, 1u32..50, 1i64..10_000), 1..20)) {
            let (store, _provider) = fresh_store();
            let key = nanjing();

            for (id, qty, cents) in adds {
                let _ = store.add_item_in(&key, product(&format!("p-{id}"), cents, None), qty);
            }

            let items = store.items_in(&key);
            let expected = regional_cart_core::calculate_stats(&items);
            prop_assert_eq!(store.stats_in(&key), expected);
        }
    }
}

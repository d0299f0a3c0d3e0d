//! Derived cart statistics.
//!
//! Stats are always recomputed from an item list, never stored. The
//! calculator is a pure function; memoization is the store's concern.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::types::CartItem;

/// Aggregate figures for one region's cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CartStats {
    /// Number of distinct products.
    pub item_count: usize,
    /// Sum of all quantities.
    pub total_items: u64,
    /// Sum of price × quantity, rounded half-away-from-zero to cents.
    pub total_amount: Decimal,
}

/// Compute the stats for an item list.
#[must_use]
pub fn calculate_stats(items: &[CartItem]) -> CartStats {
    let total_amount = items
        .iter()
        .map(|item| item.product.price * Decimal::from(item.quantity))
        .sum::<Decimal>()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    CartStats {
        item_count: items.len(),
        total_items: items.iter().map(|item| u64::from(item.quantity)).sum(),
        total_amount,
    }
}

/// Format an amount for display, e.g. `"¥29.90"`.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    format!("¥{amount:.2}")
}

//! Cart item entity and quantity bounds.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::product::Product;

/// Smallest quantity a cart item can hold. Reaching zero removes the item.
pub const MIN_QUANTITY: u32 = 1;

/// Largest quantity a cart item can hold. Merges beyond this are clamped and
/// the excess dropped.
pub const MAX_QUANTITY: u32 = 999;

/// Maximum number of distinct products a single region partition may hold.
pub const MAX_PARTITION_PRODUCTS: usize = 50;

/// Clamp a requested quantity into the permitted `[MIN_QUANTITY, MAX_QUANTITY]`
/// range. Callers route zero to removal before clamping.
#[must_use]
pub const fn clamp_quantity(quantity: u32) -> u32 {
    if quantity < MIN_QUANTITY {
        MIN_QUANTITY
    } else if quantity > MAX_QUANTITY {
        MAX_QUANTITY
    } else {
        quantity
    }
}

/// One product line in a region's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product snapshot captured at add time.
    pub product: Product,
    /// Purchase quantity, within `[MIN_QUANTITY, MAX_QUANTITY]`.
    pub quantity: u32,
    /// When the item first entered the cart. Serialized as epoch milliseconds;
    /// used for ordering and retention pruning.
    #[serde(rename = "addedAt", with = "chrono::serde::ts_milliseconds")]
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Create a new cart item stamped with the current time.
    #[must_use]
    pub fn new(product: Product, quantity: u32) -> Self {
        Self {
            product,
            quantity,
            added_at: Utc::now(),
        }
    }

    /// Line subtotal: price × quantity, rounded half-away-from-zero to cents.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        (self.product.price * Decimal::from(self.quantity))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

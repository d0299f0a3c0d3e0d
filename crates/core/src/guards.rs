//! Stock and capacity guards.
//!
//! Pure predicates consulted before quantity mutations. Guards never clamp
//! or adjust; a caller that fails a guard must surface a distinguishable
//! reason (stock-insufficient vs max-cap-reached vs off-shelf) so user
//! messaging can be specific.

use crate::types::{CartItem, MAX_QUANTITY, MIN_QUANTITY, ProductStatus};

/// True iff the item's quantity may grow by one: below the hard cap and,
/// when a stock count is known, below that stock.
#[must_use]
pub fn can_increase(item: &CartItem) -> bool {
    if item.quantity >= MAX_QUANTITY {
        return false;
    }
    item.product.stock.is_none_or(|stock| item.quantity < stock)
}

/// True iff the item's quantity may shrink by one without hitting zero.
#[must_use]
pub const fn can_decrease(item: &CartItem) -> bool {
    item.quantity > MIN_QUANTITY
}

/// True iff the captured product snapshot marks the item no longer
/// purchasable.
#[must_use]
pub fn is_off_shelf(item: &CartItem) -> bool {
    matches!(
        item.product.status,
        Some(ProductStatus::OffSale | ProductStatus::SoldOut)
    )
}

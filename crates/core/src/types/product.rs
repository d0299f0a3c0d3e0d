//! Product snapshot types.
//!
//! A [`Product`] is captured once when an item enters the cart and is never
//! silently refreshed afterwards; staleness is only surfaced through the
//! status-based guards.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Type-safe product identifier.
///
/// Wraps the catalog's opaque string id so product ids cannot be confused
/// with other string values (region keys, image references, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a new product id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the id and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns true if the id is the empty string.
    ///
    /// An empty id never identifies a real catalog entry; loaded cart
    /// entries with an empty id are discarded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Sale status of a product at snapshot time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    OnSale,
    OffSale,
    SoldOut,
    PreSale,
}

/// A product snapshot as captured when the item was added to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique catalog identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price. Never negative.
    pub price: Decimal,
    /// Main image reference for cart display.
    pub image: String,
    /// Sale unit, e.g. "斤", "kg", "袋".
    pub unit: String,
    /// Known stock count, used for stock-insufficient messaging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    /// Sale status, used to flag items that went off shelf after capture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProductStatus>,
    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Product {
    /// Format the unit price for display, e.g. `"¥5.00/斤"`.
    #[must_use]
    pub fn format_unit_price(&self) -> String {
        format!("¥{:.2}/{}", self.price, self.unit)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn apple() -> Product {
        Product {
            id: ProductId::new("p-apple"),
            name: "苹果".to_owned(),
            price: Decimal::new(500, 2),
            image: "https://cdn.example.com/apple.jpg".to_owned(),
            unit: "斤".to_owned(),
            stock: Some(10),
            status: Some(ProductStatus::OnSale),
            description: None,
        }
    }

    #[test]
    fn test_product_id_round_trip() {
        let id = ProductId::new("p-123");
        assert_eq!(id.as_str(), "p-123");
        assert_eq!(id.to_string(), "p-123");
        assert!(!id.is_empty());
        assert!(ProductId::new("").is_empty());
    }

    #[test]
    fn test_status_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&ProductStatus::OffSale).unwrap(),
            "\"off_sale\""
        );
        assert_eq!(
            serde_json::from_str::<ProductStatus>("\"sold_out\"").unwrap(),
            ProductStatus::SoldOut
        );
    }

    #[test]
    fn test_format_unit_price() {
        assert_eq!(apple().format_unit_price(), "¥5.00/斤");
    }

    #[test]
    fn test_optional_fields_absent_in_json() {
        let mut product = apple();
        product.stock = None;
        product.status = None;
        let json = serde_json::to_value(&product).unwrap();
        assert!(json.get("stock").is_none());
        assert!(json.get("status").is_none());
        assert!(json.get("description").is_none());
    }
}

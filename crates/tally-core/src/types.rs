//! # Domain Types
//!
//! Core domain types used throughout the checkout.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   StockLevel    │   │   Promotion     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │   │  id (i64)       │   │  kind           │       │
//! │  │  serial (scan)  │   │  product_id     │   │  product_id     │       │
//! │  │  name           │   │  quantity       │   │  match_quantity │       │
//! │  │  price_cents    │   └─────────────────┘   │  promo_value    │       │
//! │  └─────────────────┘                         │  promo_product  │       │
//! │                                              └─────────────────┘       │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │  ScannedItems   │──►│    Checkout     │  lines: Vec<CheckoutLine>   │
//! │  │  serial → count │   │  total_items    │                             │
//! │  └─────────────────┘   │  total_price    │                             │
//! │                        └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Products have:
//! - `id`: numeric primary key used for relations (stock, promotions)
//! - `serial`: the scan code printed on the item

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Numeric identifier.
    pub id: i64,

    /// Scan code - business identifier.
    pub serial: String,

    /// Display name shown on the receipt.
    pub name: String,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Stock Level
// =============================================================================

/// The inventory row tracking remaining sellable quantity for one product.
///
/// Only the inventory reservation mutates these rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockLevel {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Promotion Kind
// =============================================================================

/// Stored promotion type code.
///
/// The declaration order is the resolution order: promotions for one
/// product are applied sorted by kind ascending, so a percentage discount
/// always sees the subtotal left by the earlier kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionKind {
    /// Unknown or unset type. Never applied.
    Undefined,
    /// Buying the trigger product grants free units of another product.
    BonusItem,
    /// Buy N, pay for M.
    BuyItemsForReducePrice,
    /// Percent off the running line subtotal.
    DiscountInPercent,
    /// Reserved. Has no behavior yet.
    FreeItem,
}

impl PromotionKind {
    /// Decodes a stored type code. Unknown codes decode to `Undefined`.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => PromotionKind::BonusItem,
            2 => PromotionKind::BuyItemsForReducePrice,
            3 => PromotionKind::DiscountInPercent,
            4 => PromotionKind::FreeItem,
            _ => PromotionKind::Undefined,
        }
    }

    /// Returns the stored type code.
    pub const fn code(&self) -> i64 {
        match self {
            PromotionKind::Undefined => 0,
            PromotionKind::BonusItem => 1,
            PromotionKind::BuyItemsForReducePrice => 2,
            PromotionKind::DiscountInPercent => 3,
            PromotionKind::FreeItem => 4,
        }
    }
}

impl Default for PromotionKind {
    fn default() -> Self {
        PromotionKind::Undefined
    }
}

// =============================================================================
// Promotion
// =============================================================================

/// A promotional rule attached to a trigger product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    pub id: i64,
    pub kind: PromotionKind,
    /// Trigger product.
    pub product_id: i64,
    /// Threshold quantity. Zero means "never triggers" for kinds that check it.
    pub match_quantity: i64,
    /// Free-unit count, paid-unit count, or percent depending on `kind`.
    pub promo_value: i64,
    /// Product receiving free units (0 = not applicable).
    pub promo_product_id: i64,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker. Lookups exclude deleted promotions.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Promotions keyed by trigger product ID.
pub type PromotionMap = BTreeMap<i64, Vec<Promotion>>;

// =============================================================================
// Scanned Items
// =============================================================================

/// Scan counts keyed by serial.
///
/// Duplicate scans of the same serial increment its count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScannedItems(BTreeMap<String, i64>);

impl ScannedItems {
    /// Folds a raw list of scans into per-serial counts.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::ScannedItems;
    ///
    /// let scans = ScannedItems::from_scans(["120P90", "43N23P", "120P90"]);
    /// assert_eq!(scans.quantity_of("120P90"), 2);
    /// assert_eq!(scans.quantity_of("43N23P"), 1);
    /// assert_eq!(scans.len(), 2);
    /// ```
    pub fn from_scans<I, S>(scans: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut counts = BTreeMap::new();
        for serial in scans {
            *counts.entry(serial.into()).or_insert(0) += 1;
        }
        ScannedItems(counts)
    }

    /// Builds from already-counted scans.
    pub fn from_counts(counts: BTreeMap<String, i64>) -> Self {
        ScannedItems(counts)
    }

    /// Scan count for a serial, 0 if it was not scanned.
    pub fn quantity_of(&self, serial: &str) -> i64 {
        self.0.get(serial).copied().unwrap_or(0)
    }

    /// Distinct scanned serials in ascending order.
    pub fn serials(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(serial, qty)| (serial.as_str(), *qty))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// Checkout Line
// =============================================================================

/// One product's quantity and priced subtotal in a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutLine {
    pub product: Product,
    pub quantity: i64,
    pub subtotal: Money,
}

impl CheckoutLine {
    /// A line for units granted at zero cost.
    pub fn free(product: Product, quantity: i64) -> Self {
        CheckoutLine {
            product,
            quantity,
            subtotal: Money::zero(),
        }
    }
}

// =============================================================================
// Checkout
// =============================================================================

/// A priced checkout, ready to be committed against inventory.
///
/// ## Invariants
/// - `total_items` equals the sum of line quantities
/// - `total_price` equals the sum of line subtotals
/// - A product appears at most once among the lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkout {
    pub lines: Vec<CheckoutLine>,
    pub total_items: i64,
    pub total_price: Money,
}

impl Checkout {
    /// Builds a checkout, computing totals from the lines.
    pub fn from_lines(lines: Vec<CheckoutLine>) -> Self {
        let total_items = lines
            .iter()
            .fold(0i64, |total, line| total.saturating_add(line.quantity));
        let total_price = lines.iter().map(|line| line.subtotal).sum();
        Checkout {
            lines,
            total_items,
            total_price,
        }
    }

    /// Distinct product IDs referenced by the lines, ascending.
    pub fn product_ids(&self) -> Vec<i64> {
        self.lines
            .iter()
            .map(|line| line.product.id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Finds the line for a product.
    pub fn line_for(&self, product_id: i64) -> Option<&CheckoutLine> {
        self.lines.iter().find(|line| line.product.id == product_id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, price_cents: i64) -> Product {
        Product {
            id,
            serial: format!("SER-{id}"),
            name: format!("Product {id}"),
            price_cents,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_promotion_kind_codes() {
        assert_eq!(PromotionKind::from_code(1), PromotionKind::BonusItem);
        assert_eq!(PromotionKind::from_code(3), PromotionKind::DiscountInPercent);
        assert_eq!(PromotionKind::from_code(42), PromotionKind::Undefined);
        assert_eq!(PromotionKind::from_code(-1), PromotionKind::Undefined);
        assert_eq!(PromotionKind::BuyItemsForReducePrice.code(), 2);
    }

    #[test]
    fn test_promotion_kind_order_follows_codes() {
        let mut kinds = vec![
            PromotionKind::DiscountInPercent,
            PromotionKind::BonusItem,
            PromotionKind::BuyItemsForReducePrice,
        ];
        kinds.sort();
        assert_eq!(
            kinds,
            vec![
                PromotionKind::BonusItem,
                PromotionKind::BuyItemsForReducePrice,
                PromotionKind::DiscountInPercent,
            ]
        );
    }

    #[test]
    fn test_scanned_items_counts_duplicates() {
        let scans = ScannedItems::from_scans(vec!["B".to_string(), "A".into(), "B".into()]);
        assert_eq!(scans.serials(), vec!["A".to_string(), "B".to_string()]);
        assert_eq!(scans.quantity_of("B"), 2);
        assert_eq!(scans.quantity_of("missing"), 0);
    }

    #[test]
    fn test_checkout_totals_and_ids() {
        let checkout = Checkout::from_lines(vec![
            CheckoutLine {
                product: product(4, 3000),
                quantity: 2,
                subtotal: Money::from_cents(3000),
            },
            CheckoutLine::free(product(2, 539999), 1),
        ]);

        assert_eq!(checkout.total_items, 3);
        assert_eq!(checkout.total_price.cents(), 3000);
        assert_eq!(checkout.product_ids(), vec![2, 4]);
        assert_eq!(checkout.line_for(2).map(|l| l.quantity), Some(1));
        assert!(checkout.line_for(9).is_none());
    }
}

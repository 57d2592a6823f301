//! # Promotion Rules
//!
//! Resolves one checkout line against the promotions of its product.
//!
//! ## Resolution Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  resolve_line(quantity, product, promotions sorted by kind)            │
//! │                                                                         │
//! │  subtotal = quantity × price                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BonusItem ──────────────► free_units[target] += ⌊q/m⌋ × v              │
//! │       │                    (subtotal untouched)                         │
//! │       ▼                                                                 │
//! │  BuyItemsForReducePrice ─► subtotal = (⌊q/m⌋ × v + q mod m) × price     │
//! │       │                    (replaces the running subtotal)              │
//! │       ▼                                                                 │
//! │  DiscountInPercent ──────► subtotal -= subtotal × v / 100               │
//! │       │                    (sees whatever the earlier rules left)       │
//! │       ▼                                                                 │
//! │  LineResolution { subtotal, free_units }                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use serde::Serialize;

use crate::money::Money;
use crate::types::{Product, Promotion, PromotionKind};

// =============================================================================
// Promotion Rule
// =============================================================================

/// A stored promotion decoded into the behavior it triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionRule {
    /// Every `match_quantity` units bought grant `free_units` of the target.
    BonusItem {
        match_quantity: i64,
        free_units: i64,
        target_product_id: i64,
    },
    /// Every `match_quantity` units bought are charged as `paid_units`.
    BuyItemsForReducePrice { match_quantity: i64, paid_units: i64 },
    /// `percent` off the running subtotal once `match_quantity` is reached.
    DiscountInPercent { match_quantity: i64, percent: i64 },
    /// Undefined, reserved or unknown kinds.
    Ignored,
}

impl From<&Promotion> for PromotionRule {
    fn from(promo: &Promotion) -> Self {
        match promo.kind {
            PromotionKind::BonusItem => PromotionRule::BonusItem {
                match_quantity: promo.match_quantity,
                free_units: promo.promo_value,
                target_product_id: promo.promo_product_id,
            },
            PromotionKind::BuyItemsForReducePrice => PromotionRule::BuyItemsForReducePrice {
                match_quantity: promo.match_quantity,
                paid_units: promo.promo_value,
            },
            PromotionKind::DiscountInPercent => PromotionRule::DiscountInPercent {
                match_quantity: promo.match_quantity,
                percent: promo.promo_value,
            },
            PromotionKind::Undefined | PromotionKind::FreeItem => PromotionRule::Ignored,
        }
    }
}

impl PromotionRule {
    /// Applies this rule to a line in progress.
    fn apply(&self, quantity: i64, price: Money, line: &mut LineResolution) {
        match *self {
            PromotionRule::BonusItem {
                match_quantity,
                free_units,
                target_product_id,
            } => {
                if target_product_id == 0 || match_quantity <= 0 || quantity < match_quantity {
                    return;
                }
                line.free_units.grant(
                    target_product_id,
                    (quantity / match_quantity).saturating_mul(free_units),
                );
            }

            PromotionRule::BuyItemsForReducePrice {
                match_quantity,
                paid_units,
            } => {
                // A negative paid count never triggers.
                let triggers = match_quantity > 0 && paid_units >= 0 && quantity >= match_quantity;
                let payable = if triggers {
                    (quantity / match_quantity)
                        .saturating_mul(paid_units)
                        .saturating_add(quantity % match_quantity)
                } else {
                    quantity
                };
                line.subtotal = price.multiply_quantity(payable);
            }

            PromotionRule::DiscountInPercent {
                match_quantity,
                percent,
            } => {
                if !(0..=100).contains(&percent) || quantity < match_quantity {
                    return;
                }
                let discount = line.subtotal.percentage_of(percent);
                line.subtotal -= discount;
            }

            PromotionRule::Ignored => {}
        }
    }
}

// =============================================================================
// Free Unit Grant
// =============================================================================

/// Units of other products owed at zero cost, keyed by product ID.
///
/// Backed by a `BTreeMap` so iteration is always in ascending product ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FreeUnitGrant(BTreeMap<i64, i64>);

impl FreeUnitGrant {
    pub fn new() -> Self {
        FreeUnitGrant::default()
    }

    /// Adds `units` free units of a product. Non-positive amounts are ignored.
    pub fn grant(&mut self, product_id: i64, units: i64) {
        if units <= 0 {
            return;
        }
        let total = self.0.entry(product_id).or_insert(0);
        *total = total.saturating_add(units);
    }

    /// Adds every grant of `other` into this one.
    pub fn merge(&mut self, other: &FreeUnitGrant) {
        for (&product_id, &units) in &other.0 {
            self.grant(product_id, units);
        }
    }

    /// Removes and returns the grant for a product (0 if none).
    pub fn take(&mut self, product_id: i64) -> i64 {
        self.0.remove(&product_id).unwrap_or(0)
    }

    pub fn units_for(&self, product_id: i64) -> i64 {
        self.0.get(&product_id).copied().unwrap_or(0)
    }

    /// Granted product IDs, ascending.
    pub fn product_ids(&self) -> Vec<i64> {
        self.0.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.0.iter().map(|(&id, &units)| (id, units))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// Line Resolution
// =============================================================================

/// Result of resolving one line: its subtotal plus grants for other products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineResolution {
    pub subtotal: Money,
    pub free_units: FreeUnitGrant,
}

/// Resolves the subtotal and free-unit grants of one line.
///
/// `promotions` must already be sorted by kind ascending; they are applied in
/// the given order.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use tally_core::{resolve_line, Product, Promotion, PromotionKind};
///
/// let google_home = Product {
///     id: 1,
///     serial: "120P90".into(),
///     name: "Google Home".into(),
///     price_cents: 4999,
///     updated_at: Utc::now(),
/// };
/// let buy_3_pay_2 = Promotion {
///     id: 2,
///     kind: PromotionKind::BuyItemsForReducePrice,
///     product_id: 1,
///     match_quantity: 3,
///     promo_value: 2,
///     promo_product_id: 0,
///     updated_at: Utc::now(),
///     deleted_at: None,
/// };
///
/// let line = resolve_line(4, &google_home, &[buy_3_pay_2]);
/// assert_eq!(line.subtotal.cents(), 4999 * 3);
/// ```
pub fn resolve_line(quantity: i64, product: &Product, promotions: &[Promotion]) -> LineResolution {
    let price = product.price();
    let mut line = LineResolution {
        subtotal: price.multiply_quantity(quantity),
        free_units: FreeUnitGrant::new(),
    };

    for promo in promotions {
        PromotionRule::from(promo).apply(quantity, price, &mut line);
    }

    line
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: i64, price_cents: i64) -> Product {
        Product {
            id,
            serial: format!("SER-{id}"),
            name: format!("Product {id}"),
            price_cents,
            updated_at: Utc::now(),
        }
    }

    fn promo(kind: PromotionKind, match_quantity: i64, promo_value: i64, target: i64) -> Promotion {
        Promotion {
            id: 1,
            kind,
            product_id: 1,
            match_quantity,
            promo_value,
            promo_product_id: target,
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_no_promotions_is_quantity_times_price() {
        let line = resolve_line(3, &product(1, 4999), &[]);
        assert_eq!(line.subtotal.cents(), 14997);
        assert!(line.free_units.is_empty());
    }

    #[test]
    fn test_bonus_item_grants_per_multiple() {
        let macbook = product(2, 539999);
        let bonus = promo(PromotionKind::BonusItem, 1, 1, 4);

        let line = resolve_line(2, &macbook, &[bonus.clone()]);
        assert_eq!(line.free_units.units_for(4), 2);
        // The trigger line itself is charged in full.
        assert_eq!(line.subtotal.cents(), 539999 * 2);

        let every_three = promo(PromotionKind::BonusItem, 3, 2, 4);
        let line = resolve_line(7, &macbook, &[every_three]);
        assert_eq!(line.free_units.units_for(4), 4);
    }

    #[test]
    fn test_bonus_item_guards() {
        let item = product(2, 1000);

        let no_target = promo(PromotionKind::BonusItem, 1, 1, 0);
        assert!(resolve_line(5, &item, &[no_target]).free_units.is_empty());

        let no_threshold = promo(PromotionKind::BonusItem, 0, 1, 4);
        assert!(resolve_line(5, &item, &[no_threshold]).free_units.is_empty());

        let below_threshold = promo(PromotionKind::BonusItem, 3, 1, 4);
        assert!(resolve_line(2, &item, &[below_threshold]).free_units.is_empty());
    }

    #[test]
    fn test_bonus_items_accumulate() {
        let item = product(2, 1000);
        let promos = [
            promo(PromotionKind::BonusItem, 1, 1, 4),
            promo(PromotionKind::BonusItem, 2, 3, 4),
            promo(PromotionKind::BonusItem, 1, 1, 5),
        ];

        let line = resolve_line(2, &item, &promos);
        assert_eq!(line.free_units.units_for(4), 2 + 3);
        assert_eq!(line.free_units.units_for(5), 2);
        assert_eq!(line.free_units.product_ids(), vec![4, 5]);
    }

    #[test]
    fn test_buy_items_for_reduce_price() {
        let google_home = product(1, 4999);
        let buy_3_pay_2 = promo(PromotionKind::BuyItemsForReducePrice, 3, 2, 0);

        let cases = [(2, 2), (3, 2), (4, 3), (6, 4), (7, 5)];
        for (quantity, payable) in cases {
            let line = resolve_line(quantity, &google_home, &[buy_3_pay_2.clone()]);
            assert_eq!(line.subtotal.cents(), 4999 * payable, "quantity {quantity}");
        }
    }

    #[test]
    fn test_buy_items_with_zero_threshold_charges_full_price() {
        let line = resolve_line(
            5,
            &product(1, 100),
            &[promo(PromotionKind::BuyItemsForReducePrice, 0, 2, 0)],
        );
        assert_eq!(line.subtotal.cents(), 500);
    }

    #[test]
    fn test_buy_items_with_negative_paid_units_charges_full_price() {
        let bad_row = promo(PromotionKind::BuyItemsForReducePrice, 3, -2, 0);

        let line = resolve_line(3, &product(1, 1000), &[bad_row]);
        assert_eq!(line.subtotal.cents(), 3000);
    }

    #[test]
    fn test_huge_promo_values_saturate() {
        let bonus = promo(PromotionKind::BonusItem, 1, i64::MAX, 4);
        let line = resolve_line(2, &product(2, 539999), &[bonus.clone(), bonus]);
        assert_eq!(line.free_units.units_for(4), i64::MAX);

        let reduce = promo(PromotionKind::BuyItemsForReducePrice, 1, i64::MAX, 0);
        let line = resolve_line(2, &product(1, 1000), &[reduce]);
        assert_eq!(line.subtotal.cents(), i64::MAX);
    }

    #[test]
    fn test_discount_in_percent() {
        let alexa = product(3, 10950);
        let ten_off_three = promo(PromotionKind::DiscountInPercent, 3, 10, 0);

        let line = resolve_line(2, &alexa, &[ten_off_three.clone()]);
        assert_eq!(line.subtotal.cents(), 10950 * 2);

        let line = resolve_line(3, &alexa, &[ten_off_three]);
        assert_eq!(line.subtotal.cents(), 32850 - 3285);
    }

    #[test]
    fn test_discount_rejects_invalid_percent() {
        let item = product(3, 1000);
        for percent in [-1, 101, 500] {
            let line = resolve_line(1, &item, &[promo(PromotionKind::DiscountInPercent, 1, percent, 0)]);
            assert_eq!(line.subtotal.cents(), 1000, "percent {percent}");
        }

        let line = resolve_line(1, &item, &[promo(PromotionKind::DiscountInPercent, 1, 100, 0)]);
        assert!(line.subtotal.is_zero());
    }

    #[test]
    fn test_discount_applies_after_reduce_price() {
        let item = product(1, 1000);
        let promos = [
            promo(PromotionKind::BuyItemsForReducePrice, 3, 2, 0),
            promo(PromotionKind::DiscountInPercent, 3, 50, 0),
        ];

        let line = resolve_line(3, &item, &promos);
        // 3 for the price of 2, then half off.
        assert_eq!(line.subtotal.cents(), 1000);
    }

    #[test]
    fn test_reduce_price_after_discount_replaces_subtotal() {
        let item = product(1, 1000);
        // Out of kind order on purpose: the later rule wins.
        let promos = [
            promo(PromotionKind::DiscountInPercent, 1, 50, 0),
            promo(PromotionKind::BuyItemsForReducePrice, 3, 2, 0),
        ];

        let line = resolve_line(3, &item, &promos);
        assert_eq!(line.subtotal.cents(), 2000);
    }

    #[test]
    fn test_ignored_kinds_have_no_effect() {
        let item = product(1, 1000);
        let promos = [
            promo(PromotionKind::Undefined, 1, 50, 4),
            promo(PromotionKind::FreeItem, 1, 50, 4),
        ];

        let line = resolve_line(2, &item, &promos);
        assert_eq!(line.subtotal.cents(), 2000);
        assert!(line.free_units.is_empty());
        assert_eq!(PromotionRule::from(&promos[1]), PromotionRule::Ignored);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let item = product(2, 539999);
        let promos = [
            promo(PromotionKind::BonusItem, 1, 1, 4),
            promo(PromotionKind::DiscountInPercent, 1, 5, 0),
        ];

        let first = resolve_line(3, &item, &promos);
        let second = resolve_line(3, &item, &promos);
        assert_eq!(first, second);
    }

    #[test]
    fn test_free_unit_grant_take_and_merge() {
        let mut grants = FreeUnitGrant::new();
        grants.grant(4, 1);
        grants.grant(9, 0);

        let mut other = FreeUnitGrant::new();
        other.grant(4, 2);
        other.grant(7, 1);
        grants.merge(&other);

        assert_eq!(grants.iter().collect::<Vec<_>>(), vec![(4, 3), (7, 1)]);
        assert_eq!(grants.take(4), 3);
        assert_eq!(grants.take(4), 0);
        assert_eq!(grants.product_ids(), vec![7]);
    }
}

//! # Checkout Aggregation
//!
//! Turns scanned quantities, looked-up products and their promotions into a
//! priced [`Checkout`].
//!
//! ## Build Steps
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CheckoutDraft::new                                                     │
//! │    1. one line per looked-up product, resolved by resolve_line()        │
//! │       free-unit grants merged into a single map                         │
//! │    2. grants targeting an existing line are reconciled into it          │
//! │                                                                         │
//! │  draft.missing_free_units()  ──► caller fetches those products by ID    │
//! │                                                                         │
//! │  draft.finish(free_products)                                            │
//! │    3. zero-cost lines appended in ascending product ID                  │
//! │    4. totals recomputed from the final lines                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Fetching the granted products is the only step that needs I/O, so it is
//! left to the caller between `new` and `finish`.

use crate::money::Money;
use crate::promotion::{resolve_line, FreeUnitGrant};
use crate::types::{Checkout, CheckoutLine, Product, Promotion, PromotionMap, ScannedItems};

/// A checkout whose scanned lines are priced but whose free lines for
/// unscanned products are not yet attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutDraft {
    lines: Vec<CheckoutLine>,
    pending: FreeUnitGrant,
}

impl CheckoutDraft {
    /// Prices every looked-up product and reconciles free units against the
    /// scanned lines.
    ///
    /// Lines keep the order of `products`. A product missing from `scanned`
    /// gets quantity 0.
    pub fn new(scanned: &ScannedItems, products: &[Product], promotions: &PromotionMap) -> Self {
        let mut lines = Vec::with_capacity(products.len());
        let mut pending = FreeUnitGrant::new();

        for product in products {
            let quantity = scanned.quantity_of(&product.serial);
            let rules = sorted_by_kind(promotions.get(&product.id).map(Vec::as_slice));

            let resolution = resolve_line(quantity, product, &rules);
            pending.merge(&resolution.free_units);

            lines.push(CheckoutLine {
                product: product.clone(),
                quantity,
                subtotal: resolution.subtotal,
            });
        }

        for line in &mut lines {
            let granted = pending.take(line.product.id);
            if granted > 0 {
                apply_grant(line, granted);
            }
        }

        CheckoutDraft { lines, pending }
    }

    /// Grants for products that have no line yet.
    pub fn missing_free_units(&self) -> &FreeUnitGrant {
        &self.pending
    }

    /// Product IDs that must be fetched before [`finish`](Self::finish),
    /// ascending.
    pub fn missing_product_ids(&self) -> Vec<i64> {
        self.pending.product_ids()
    }

    /// Scanned lines priced so far.
    pub fn lines(&self) -> &[CheckoutLine] {
        &self.lines
    }

    /// Appends a zero-cost line for every pending grant found in
    /// `free_products` and computes totals.
    ///
    /// Products without a pending grant are ignored, as are grants whose
    /// product is absent from `free_products`.
    pub fn finish(self, mut free_products: Vec<Product>) -> Checkout {
        let CheckoutDraft {
            mut lines,
            mut pending,
        } = self;

        free_products.sort_by_key(|product| product.id);
        for product in free_products {
            let granted = pending.take(product.id);
            if granted > 0 {
                lines.push(CheckoutLine::free(product, granted));
            }
        }

        Checkout::from_lines(lines)
    }
}

/// Reconciles a free-unit grant into a line that was scanned.
///
/// A grant larger than the scanned quantity raises the line to the grant and
/// makes it free. Otherwise `grant` units are taken off the subtotal.
fn apply_grant(line: &mut CheckoutLine, granted: i64) {
    if line.quantity < granted {
        line.quantity = granted;
        line.subtotal = Money::zero();
    } else {
        let credit = line.product.price().multiply_quantity(granted);
        line.subtotal = (line.subtotal - credit).clamp_non_negative();
    }
}

/// Stable sort by kind; ties keep the catalog's order.
fn sorted_by_kind(promotions: Option<&[Promotion]>) -> Vec<Promotion> {
    let mut sorted = promotions.map(<[Promotion]>::to_vec).unwrap_or_default();
    sorted.sort_by_key(|promo| promo.kind);
    sorted
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PromotionKind;
    use chrono::Utc;

    fn product(id: i64, serial: &str, name: &str, price_cents: i64) -> Product {
        Product {
            id,
            serial: serial.to_string(),
            name: name.to_string(),
            price_cents,
            updated_at: Utc::now(),
        }
    }

    fn google_home() -> Product {
        product(1, "120P90", "Google Home", 4999)
    }

    fn macbook() -> Product {
        product(2, "43N23P", "MacBook Pro", 539999)
    }

    fn alexa() -> Product {
        product(3, "A304SD", "Alexa Speaker", 10950)
    }

    fn raspberry_pi() -> Product {
        product(4, "234234", "Raspberry Pi B", 3000)
    }

    fn promo(id: i64, kind: PromotionKind, product_id: i64, m: i64, v: i64, target: i64) -> Promotion {
        Promotion {
            id,
            kind,
            product_id,
            match_quantity: m,
            promo_value: v,
            promo_product_id: target,
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    fn macbook_bonus() -> PromotionMap {
        let mut map = PromotionMap::new();
        map.insert(2, vec![promo(1, PromotionKind::BonusItem, 2, 1, 1, 4)]);
        map
    }

    fn assert_totals_consistent(checkout: &Checkout) {
        let items: i64 = checkout.lines.iter().map(|l| l.quantity).sum();
        let price: Money = checkout.lines.iter().map(|l| l.subtotal).sum();
        assert_eq!(checkout.total_items, items);
        assert_eq!(checkout.total_price, price);
        assert!(checkout.lines.iter().all(|l| l.quantity >= 0 && !l.subtotal.is_negative()));
    }

    #[test]
    fn test_bonus_item_with_target_scanned() {
        let scans = ScannedItems::from_scans(["43N23P", "234234"]);
        let draft = CheckoutDraft::new(&scans, &[macbook(), raspberry_pi()], &macbook_bonus());
        assert!(draft.missing_free_units().is_empty());

        let checkout = draft.finish(vec![]);
        assert_eq!(checkout.lines.len(), 2);

        let pi = checkout.line_for(4).expect("pi line");
        assert_eq!(pi.quantity, 1);
        assert!(pi.subtotal.is_zero());

        assert_eq!(checkout.total_items, 2);
        assert_eq!(checkout.total_price.cents(), 539999);
        assert_totals_consistent(&checkout);
    }

    #[test]
    fn test_bonus_item_with_target_not_scanned() {
        let scans = ScannedItems::from_scans(["43N23P"]);
        let draft = CheckoutDraft::new(&scans, &[macbook()], &macbook_bonus());
        assert_eq!(draft.missing_product_ids(), vec![4]);

        let checkout = draft.finish(vec![raspberry_pi()]);
        assert_eq!(checkout.lines.len(), 2);
        assert_eq!(checkout.lines[1].product.id, 4);
        assert_eq!(checkout.lines[1].quantity, 1);
        assert!(checkout.lines[1].subtotal.is_zero());

        assert_eq!(checkout.total_items, 2);
        assert_eq!(checkout.total_price.cents(), 539999);
        assert_totals_consistent(&checkout);
    }

    #[test]
    fn test_grant_larger_than_scanned_raises_line() {
        let scans = ScannedItems::from_scans(["43N23P", "43N23P", "234234"]);
        let checkout =
            CheckoutDraft::new(&scans, &[macbook(), raspberry_pi()], &macbook_bonus()).finish(vec![]);

        let pi = checkout.line_for(4).expect("pi line");
        assert_eq!(pi.quantity, 2);
        assert!(pi.subtotal.is_zero());
        assert_eq!(checkout.total_items, 4);
        assert_eq!(checkout.total_price.cents(), 539999 * 2);
        assert_totals_consistent(&checkout);
    }

    #[test]
    fn test_grant_smaller_than_scanned_credits_subtotal() {
        let scans = ScannedItems::from_counts(
            [("43N23P".to_string(), 1), ("234234".to_string(), 3)].into_iter().collect(),
        );
        let checkout =
            CheckoutDraft::new(&scans, &[macbook(), raspberry_pi()], &macbook_bonus()).finish(vec![]);

        let pi = checkout.line_for(4).expect("pi line");
        assert_eq!(pi.quantity, 3);
        assert_eq!(pi.subtotal.cents(), 6000);
        assert_totals_consistent(&checkout);
    }

    #[test]
    fn test_grant_credit_is_floored_at_zero() {
        // The Pi line is already discounted to $15; a $30 credit cannot push it negative.
        let mut promotions = macbook_bonus();
        promotions.insert(4, vec![promo(2, PromotionKind::DiscountInPercent, 4, 1, 50, 0)]);

        let scans = ScannedItems::from_scans(["43N23P", "234234"]);
        let checkout =
            CheckoutDraft::new(&scans, &[macbook(), raspberry_pi()], &promotions).finish(vec![]);

        assert!(checkout.line_for(4).expect("pi line").subtotal.is_zero());
        assert_totals_consistent(&checkout);
    }

    #[test]
    fn test_buy_three_pay_two() {
        let mut promotions = PromotionMap::new();
        promotions.insert(1, vec![promo(2, PromotionKind::BuyItemsForReducePrice, 1, 3, 2, 0)]);

        for (scans, paid) in [(3, 2), (4, 3), (6, 4)] {
            let items = ScannedItems::from_scans(std::iter::repeat("120P90").take(scans));
            let checkout = CheckoutDraft::new(&items, &[google_home()], &promotions).finish(vec![]);

            assert_eq!(checkout.total_items, scans as i64);
            assert_eq!(checkout.total_price.cents(), 4999 * paid, "{scans} scans");
        }
    }

    #[test]
    fn test_percent_discount_threshold() {
        let mut promotions = PromotionMap::new();
        promotions.insert(3, vec![promo(3, PromotionKind::DiscountInPercent, 3, 3, 10, 0)]);

        let two = ScannedItems::from_scans(["A304SD", "A304SD"]);
        let checkout = CheckoutDraft::new(&two, &[alexa()], &promotions).finish(vec![]);
        assert_eq!(checkout.total_price.cents(), 21900);

        let three = ScannedItems::from_scans(["A304SD", "A304SD", "A304SD"]);
        let checkout = CheckoutDraft::new(&three, &[alexa()], &promotions).finish(vec![]);
        assert_eq!(checkout.total_price.cents(), 32850 - 3285);
    }

    #[test]
    fn test_negative_paid_units_never_make_a_negative_total() {
        let mut promotions = PromotionMap::new();
        promotions.insert(1, vec![promo(2, PromotionKind::BuyItemsForReducePrice, 1, 3, -2, 0)]);

        let items = ScannedItems::from_scans(["120P90", "120P90", "120P90"]);
        let checkout = CheckoutDraft::new(&items, &[google_home()], &promotions).finish(vec![]);

        assert_eq!(checkout.total_price.cents(), 4999 * 3);
        assert_totals_consistent(&checkout);
    }

    #[test]
    fn test_oversized_bonus_grant_saturates_totals() {
        let mut promotions = PromotionMap::new();
        promotions.insert(2, vec![promo(1, PromotionKind::BonusItem, 2, 1, i64::MAX, 4)]);

        let scans = ScannedItems::from_scans(["43N23P", "43N23P"]);
        let checkout =
            CheckoutDraft::new(&scans, &[macbook()], &promotions).finish(vec![raspberry_pi()]);

        let pi = checkout.line_for(4).expect("pi line");
        assert_eq!(pi.quantity, i64::MAX);
        assert!(pi.subtotal.is_zero());
        assert_eq!(checkout.total_items, i64::MAX);
        assert_eq!(checkout.total_price.cents(), 539999 * 2);
    }

    #[test]
    fn test_unsorted_promotions_are_resolved_by_kind() {
        let mut promotions = PromotionMap::new();
        promotions.insert(
            1,
            vec![
                promo(7, PromotionKind::DiscountInPercent, 1, 1, 50, 0),
                promo(8, PromotionKind::BuyItemsForReducePrice, 1, 3, 2, 0),
            ],
        );

        let scans = ScannedItems::from_scans(["120P90", "120P90", "120P90"]);
        let checkout = CheckoutDraft::new(&scans, &[google_home()], &promotions).finish(vec![]);

        // 3 for 2, then half off: 9998 / 2.
        assert_eq!(checkout.total_price.cents(), 4999);
    }

    #[test]
    fn test_free_lines_appended_in_ascending_id() {
        let mut promotions = PromotionMap::new();
        promotions.insert(
            2,
            vec![
                promo(1, PromotionKind::BonusItem, 2, 1, 1, 4),
                promo(2, PromotionKind::BonusItem, 2, 1, 2, 3),
            ],
        );

        let scans = ScannedItems::from_scans(["43N23P"]);
        let draft = CheckoutDraft::new(&scans, &[macbook()], &promotions);
        assert_eq!(draft.missing_product_ids(), vec![3, 4]);

        // Fetched out of order on purpose.
        let checkout = draft.finish(vec![raspberry_pi(), alexa()]);
        let ids: Vec<i64> = checkout.lines.iter().map(|l| l.product.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
        assert_eq!(checkout.line_for(3).map(|l| l.quantity), Some(2));
        assert_eq!(checkout.total_items, 4);
        assert_totals_consistent(&checkout);
    }

    #[test]
    fn test_unfetched_grant_is_skipped() {
        let scans = ScannedItems::from_scans(["43N23P"]);
        let checkout = CheckoutDraft::new(&scans, &[macbook()], &macbook_bonus()).finish(vec![]);

        assert_eq!(checkout.lines.len(), 1);
        assert_eq!(checkout.total_items, 1);
    }

    #[test]
    fn test_product_absent_from_request_has_zero_quantity() {
        let scans = ScannedItems::from_scans(["120P90"]);
        let checkout =
            CheckoutDraft::new(&scans, &[google_home(), alexa()], &PromotionMap::new()).finish(vec![]);

        assert_eq!(checkout.line_for(3).map(|l| l.quantity), Some(0));
        assert_eq!(checkout.total_items, 1);
        assert_eq!(checkout.total_price.cents(), 4999);
    }

    #[test]
    fn test_lines_keep_lookup_order() {
        let scans = ScannedItems::from_scans(["234234", "120P90"]);
        let draft = CheckoutDraft::new(&scans, &[google_home(), raspberry_pi()], &PromotionMap::new());

        let ids: Vec<i64> = draft.lines().iter().map(|l| l.product.id).collect();
        assert_eq!(ids, vec![1, 4]);
    }
}

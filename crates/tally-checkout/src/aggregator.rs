//! # Checkout Aggregator
//!
//! Runs the pure [`CheckoutDraft`] and fills in the one step it cannot do
//! itself: fetching products that were granted free but never scanned.

use std::collections::BTreeSet;

use tally_core::{Checkout, CheckoutDraft, Product, PromotionMap, ScannedItems};
use tracing::{debug, warn};

use crate::catalog::ProductCatalog;
use crate::error::CheckoutResult;

/// Builds the priced checkout for `scanned`.
///
/// `products` is the serial lookup result and `promotions` its promotions.
/// Free lines for unscanned products are appended in ascending product ID.
/// A granted product the catalog no longer knows is skipped with a warning.
pub async fn build_checkout<C>(
    catalog: &C,
    scanned: &ScannedItems,
    products: &[Product],
    promotions: &PromotionMap,
) -> CheckoutResult<Checkout>
where
    C: ProductCatalog,
{
    let draft = CheckoutDraft::new(scanned, products, promotions);

    let missing = draft.missing_product_ids();
    let free_products = if missing.is_empty() {
        Vec::new()
    } else {
        debug!(?missing, "Fetching products granted as free units");
        let fetched = catalog.products_by_ids(&missing).await?;

        let found: BTreeSet<i64> = fetched.iter().map(|p| p.id).collect();
        for id in missing.iter().filter(|id| !found.contains(id)) {
            warn!(
                product_id = *id,
                units = draft.missing_free_units().units_for(*id),
                "Granted product not found, free units dropped"
            );
        }
        fetched
    };

    Ok(draft.finish(free_products))
}

// =============================================================================
// Unit Tests
// =============================================================================

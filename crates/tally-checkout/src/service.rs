//! # Checkout Service
//!
//! Sequences one checkout submission.
//!
//! ## Submit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  submit(scanned)                                                       │
//! │       │                                                                 │
//! │       ├── validate_scanned_items ─────────── ✗ VALIDATION_ERROR         │
//! │       ▼                                                                 │
//! │  products_by_serials ─── empty? ──────────── ✗ NOT_FOUND                │
//! │       ▼                                                                 │
//! │  promotions_by_products                                                │
//! │       ▼                                                                 │
//! │  build_checkout (resolve, reconcile, append free lines)                │
//! │       ▼                                                                 │
//! │  commit_checkout ─── short on stock? ─────── ✗ INSUFFICIENT_STOCK       │
//! │       ▼                                                                 │
//! │  committed Checkout                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The first failure ends the submission. Nothing is retried here; callers
//! decide using [`CheckoutError::is_retryable`](crate::CheckoutError::is_retryable).

use std::collections::BTreeSet;

use tally_core::validation::validate_scanned_items;
use tally_core::{Checkout, CoreError, ScannedItems};
use tracing::{debug, info};

use crate::aggregator::build_checkout;
use crate::catalog::{ProductCatalog, PromotionCatalog, StockLedger};
use crate::error::CheckoutResult;

/// Submits checkouts against a set of collaborators.
#[derive(Debug, Clone)]
pub struct CheckoutService<C> {
    store: C,
}

impl<C> CheckoutService<C>
where
    C: ProductCatalog + PromotionCatalog + StockLedger,
{
    pub fn new(store: C) -> Self {
        CheckoutService { store }
    }

    pub fn store(&self) -> &C {
        &self.store
    }

    /// Prices `scanned`, reserves its stock and returns the committed
    /// checkout.
    ///
    /// Serials that match no product are dropped; the submission fails with
    /// `NotFound` only when none match.
    pub async fn submit(&self, scanned: &ScannedItems) -> CheckoutResult<Checkout> {
        validate_scanned_items(scanned)?;

        let serials = scanned.serials();
        debug!(serials = serials.len(), "Submitting checkout");

        let products = self.store.products_by_serials(&serials).await?;
        if products.is_empty() {
            return Err(CoreError::ProductNotFound {
                serials: serials.join(", "),
            }
            .into());
        }

        if products.len() < serials.len() {
            let known: BTreeSet<&str> = products.iter().map(|p| p.serial.as_str()).collect();
            let unknown: Vec<&str> = serials
                .iter()
                .map(String::as_str)
                .filter(|s| !known.contains(s))
                .collect();
            debug!(?unknown, "Ignoring unknown serials");
        }

        let promotions = self.store.promotions_by_products(&products).await?;
        let checkout = build_checkout(&self.store, scanned, &products, &promotions).await?;

        let committed = self.store.commit_checkout(checkout).await?;

        info!(
            lines = committed.lines.len(),
            total_items = committed.total_items,
            total_price = %committed.total_price,
            "Checkout committed"
        );
        Ok(committed)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

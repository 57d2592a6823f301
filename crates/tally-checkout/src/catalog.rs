//! # Collaborators
//!
//! The lookups and the stock ledger a checkout depends on, as traits so the
//! orchestration can run against SQLite or an in-memory fake.
//!
//! [`Database`] implements all three.

use tally_core::{Checkout, Product, PromotionMap};
use tally_db::Database;

use crate::error::CheckoutResult;

/// Product lookups.
pub trait ProductCatalog {
    /// Products whose serial is in `serials`, ordered by ID. Unmatched
    /// serials are dropped.
    async fn products_by_serials(&self, serials: &[String]) -> CheckoutResult<Vec<Product>>;

    /// Products whose ID is in `ids`. Unknown IDs are dropped.
    async fn products_by_ids(&self, ids: &[i64]) -> CheckoutResult<Vec<Product>>;
}

/// Promotion lookup.
pub trait PromotionCatalog {
    /// Live promotions of `products`, keyed by trigger product and sorted by
    /// kind then ID.
    async fn promotions_by_products(&self, products: &[Product]) -> CheckoutResult<PromotionMap>;
}

/// Durable stock decrement.
pub trait StockLedger {
    /// Reserves stock for every line atomically, or nothing at all.
    async fn commit_checkout(&self, checkout: Checkout) -> CheckoutResult<Checkout>;
}

impl ProductCatalog for Database {
    async fn products_by_serials(&self, serials: &[String]) -> CheckoutResult<Vec<Product>> {
        Ok(self.products().by_serials(serials).await?)
    }

    async fn products_by_ids(&self, ids: &[i64]) -> CheckoutResult<Vec<Product>> {
        Ok(self.products().by_ids(ids).await?)
    }
}

impl PromotionCatalog for Database {
    async fn promotions_by_products(&self, products: &[Product]) -> CheckoutResult<PromotionMap> {
        let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
        Ok(self.promotions().for_products(&ids).await?)
    }
}

impl StockLedger for Database {
    async fn commit_checkout(&self, checkout: Checkout) -> CheckoutResult<Checkout> {
        Ok(self.inventory().commit_checkout(checkout).await?)
    }
}

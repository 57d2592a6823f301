//! # Demo Catalog
//!
//! The four-product catalog used by the `seed` binary and by tests.
//!
//! | id | serial | name           | price    | promotion                          |
//! |----|--------|----------------|----------|------------------------------------|
//! | 1  | 120P90 | Google Home    | $49.99   | buy 3, pay 2                       |
//! | 2  | 43N23P | MacBook Pro    | $5399.99 | each one bought: 1 free Raspberry Pi |
//! | 3  | A304SD | Alexa Speaker  | $109.50  | 10% off from 3 units               |
//! | 4  | 234234 | Raspberry Pi B | $30.00   |                                    |
//!
//! Every product starts with [`DEMO_STOCK`] units.

use tracing::info;

use crate::error::DbResult;
use crate::pool::Database;
use crate::repository::promotion::NewPromotion;
use tally_core::{Product, Promotion, PromotionKind};

/// Initial stock of every demo product.
pub const DEMO_STOCK: i64 = 10;

const DEMO_PRODUCTS: &[(&str, &str, i64)] = &[
    ("120P90", "Google Home", 4999),
    ("43N23P", "MacBook Pro", 539999),
    ("A304SD", "Alexa Speaker", 10950),
    ("234234", "Raspberry Pi B", 3000),
];

/// What [`seed_demo_catalog`] inserted.
#[derive(Debug, Clone)]
pub struct DemoCatalog {
    pub products: Vec<Product>,
    pub promotions: Vec<Promotion>,
}

/// Inserts the demo products, their stock and promotions.
///
/// Fails with `DbError::UniqueViolation` if the products already exist.
pub async fn seed_demo_catalog(db: &Database) -> DbResult<DemoCatalog> {
    let mut products = Vec::with_capacity(DEMO_PRODUCTS.len());
    for (serial, name, price_cents) in DEMO_PRODUCTS {
        let product = db.products().insert(serial, name, *price_cents).await?;
        db.inventory().set_stock(product.id, DEMO_STOCK).await?;
        products.push(product);
    }

    let id_of = |serial: &str| {
        products
            .iter()
            .find(|p| p.serial == serial)
            .map(|p| p.id)
            .unwrap_or_default()
    };

    let rules = [
        NewPromotion {
            kind: PromotionKind::BonusItem,
            product_id: id_of("43N23P"),
            match_quantity: 1,
            promo_value: 1,
            promo_product_id: id_of("234234"),
        },
        NewPromotion {
            kind: PromotionKind::BuyItemsForReducePrice,
            product_id: id_of("120P90"),
            match_quantity: 3,
            promo_value: 2,
            promo_product_id: 0,
        },
        NewPromotion {
            kind: PromotionKind::DiscountInPercent,
            product_id: id_of("A304SD"),
            match_quantity: 3,
            promo_value: 10,
            promo_product_id: 0,
        },
    ];

    let mut promotions = Vec::with_capacity(rules.len());
    for rule in rules {
        promotions.push(db.promotions().insert(rule).await?);
    }

    info!(
        products = products.len(),
        promotions = promotions.len(),
        "Demo catalog seeded"
    );

    Ok(DemoCatalog {
        products,
        promotions,
    })
}

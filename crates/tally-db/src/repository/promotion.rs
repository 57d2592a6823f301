//! # Promotion Repository
//!
//! Loads the live promotions of a set of trigger products.
//!
//! Rows come back ordered by `(product_id, kind, id)`, so each product's
//! list in the returned [`PromotionMap`] is already in resolution order.
//! Soft-deleted rows (`deleted_at IS NOT NULL`) are never returned.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tally_core::{Promotion, PromotionKind, PromotionMap};

/// Raw promotion row; `kind` is the stored type code.
#[derive(Debug, FromRow)]
struct PromotionRow {
    id: i64,
    kind: i64,
    product_id: i64,
    match_quantity: i64,
    promo_value: i64,
    promo_product_id: i64,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<PromotionRow> for Promotion {
    fn from(row: PromotionRow) -> Self {
        Promotion {
            id: row.id,
            kind: PromotionKind::from_code(row.kind),
            product_id: row.product_id,
            match_quantity: row.match_quantity,
            promo_value: row.promo_value,
            promo_product_id: row.promo_product_id,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// Fields of a promotion to create. Used by seeding and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewPromotion {
    pub kind: PromotionKind,
    pub product_id: i64,
    pub match_quantity: i64,
    pub promo_value: i64,
    pub promo_product_id: i64,
}

/// Repository for promotion database operations.
#[derive(Debug, Clone)]
pub struct PromotionRepository {
    pool: SqlitePool,
}

impl PromotionRepository {
    /// Creates a new PromotionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PromotionRepository { pool }
    }

    /// Live promotions triggered by any of `product_ids`, grouped by trigger
    /// product and sorted by kind then ID.
    ///
    /// Products without promotions have no entry in the map.
    pub async fn for_products(&self, product_ids: &[i64]) -> DbResult<PromotionMap> {
        let mut promotions = PromotionMap::new();
        if product_ids.is_empty() {
            return Ok(promotions);
        }

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT id, kind, product_id, match_quantity, promo_value, promo_product_id, \
             updated_at, deleted_at FROM promotions WHERE deleted_at IS NULL AND product_id IN (",
        );
        let mut list = query.separated(", ");
        for id in product_ids {
            list.push_bind(*id);
        }
        list.push_unseparated(") ORDER BY product_id, kind, id");

        let rows = query
            .build_query_as::<PromotionRow>()
            .fetch_all(&self.pool)
            .await?;

        debug!(products = product_ids.len(), rows = rows.len(), "Loaded promotions");

        for row in rows {
            let promo = Promotion::from(row);
            promotions.entry(promo.product_id).or_default().push(promo);
        }

        Ok(promotions)
    }

    /// Inserts a promotion and returns it with its assigned ID.
    ///
    /// Seeding and test support only; promotions are administered outside
    /// this crate.
    pub async fn insert(&self, new: NewPromotion) -> DbResult<Promotion> {
        debug!(
            kind = new.kind.code(),
            product_id = new.product_id,
            "Inserting promotion"
        );

        let row = sqlx::query_as::<_, PromotionRow>(
            r#"
            INSERT INTO promotions
                (kind, product_id, match_quantity, promo_value, promo_product_id, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id, kind, product_id, match_quantity, promo_value, promo_product_id,
                      updated_at, deleted_at
            "#,
        )
        .bind(new.kind.code())
        .bind(new.product_id)
        .bind(new.match_quantity)
        .bind(new.promo_value)
        .bind(new.promo_product_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    /// Marks a promotion deleted. Returns `false` if it was not live.
    ///
    /// Test support for the soft-delete filter in [`Self::for_products`].
    pub async fn soft_delete(&self, id: i64) -> DbResult<bool> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE promotions SET deleted_at = ?2, updated_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

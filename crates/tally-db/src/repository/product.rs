//! # Product Repository
//!
//! Catalog lookups by scan serial and by ID.
//!
//! ## Batched Lookups
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  by_serials(["43N23P", "NOPE", "234234"])                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT ... FROM products WHERE serial IN (?, ?, ?) ORDER BY id        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  [MacBook Pro (2), Raspberry Pi B (4)]   unmatched serials dropped     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::Product;

const PRODUCT_COLUMNS: &str = "SELECT id, serial, name, price_cents, updated_at FROM products";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Products matching any of `serials`, ordered by ID.
    ///
    /// Serials without a product are silently dropped; an empty result is
    /// not an error here.
    pub async fn by_serials(&self, serials: &[String]) -> DbResult<Vec<Product>> {
        if serials.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = serials.len(), "Looking up products by serial");

        let mut query = QueryBuilder::<Sqlite>::new(PRODUCT_COLUMNS);
        query.push(" WHERE serial IN (");
        let mut list = query.separated(", ");
        for serial in serials {
            list.push_bind(serial.as_str());
        }
        list.push_unseparated(") ORDER BY id");

        let products = query
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        debug!(found = products.len(), "Serial lookup complete");
        Ok(products)
    }

    /// Products with any of `ids`, ordered by ID. Unknown IDs are dropped.
    pub async fn by_ids(&self, ids: &[i64]) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        debug!(?ids, "Looking up products by id");

        let mut query = QueryBuilder::<Sqlite>::new(PRODUCT_COLUMNS);
        query.push(" WHERE id IN (");
        let mut list = query.separated(", ");
        for id in ids {
            list.push_bind(*id);
        }
        list.push_unseparated(") ORDER BY id");

        let products = query
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Gets a product by its serial.
    pub async fn get_by_serial(&self, serial: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!("{PRODUCT_COLUMNS} WHERE serial = ?1"))
            .bind(serial)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a product and returns it with its assigned ID.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - serial already exists
    pub async fn insert(&self, serial: &str, name: &str, price_cents: i64) -> DbResult<Product> {
        debug!(serial = %serial, "Inserting product");

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (serial, name, price_cents, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, serial, name, price_cents, updated_at
            "#,
        )
        .bind(serial)
        .bind(name)
        .bind(price_cents)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, serial),
            other => other,
        })?;

        Ok(product)
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::fixtures::seed_demo_catalog;
    use crate::{Database, DbConfig, DbError};

    async fn demo_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_demo_catalog(&db).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_by_serials_orders_by_id_and_drops_unknown() {
        let db = demo_db().await;

        let products = db
            .products()
            .by_serials(&["234234".into(), "NOPE".into(), "43N23P".into()])
            .await
            .unwrap();

        let serials: Vec<&str> = products.iter().map(|p| p.serial.as_str()).collect();
        assert_eq!(serials, vec!["43N23P", "234234"]);
        assert_eq!(products[0].price_cents, 539999);
    }

    #[tokio::test]
    async fn test_by_serials_with_no_match_is_empty() {
        let db = demo_db().await;
        let products = db.products().by_serials(&["NOPE".into()]).await.unwrap();
        assert!(products.is_empty());
    }

    #[tokio::test]
    async fn test_by_ids() {
        let db = demo_db().await;

        let products = db.products().by_ids(&[3, 1, 99]).await.unwrap();
        let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Google Home", "Alexa Speaker"]);

        assert!(db.products().by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_serial_is_rejected() {
        let db = demo_db().await;

        let err = db
            .products()
            .insert("120P90", "Another Google Home", 100)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(db.products().count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_get_by_serial() {
        let db = demo_db().await;

        let pi = db.products().get_by_serial("234234").await.unwrap().unwrap();
        assert_eq!(pi.name, "Raspberry Pi B");
        assert!(db.products().get_by_serial("NOPE").await.unwrap().is_none());
    }
}

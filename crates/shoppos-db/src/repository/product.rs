//! # Product Repository
//!
//! The `products` table: a read-through cache of the remote catalog.
//!
//! ## Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  query = ""        ──► newest first via idx_products_created_at         │
//! │                                                                         │
//! │  query = "Coca"    ──► lowercase ──► instr(search_key, "coca") > 0      │
//! │                        trimmed   ──► OR instr(barcode, "Coca") > 0      │
//! │                                                                         │
//! │  Both capped at `limit`, newest first, ties by name.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `instr` rather than `LIKE` so `%` and `_` typed by the cashier match
//! literally.

use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{decode_timestamp, encode_timestamp, ScanDirection};
use shoppos_core::Product;

const PRODUCT_COLUMNS: &str = "id, shop_id, barcode, name, price, cost_price, \
                               stock_quantity, image, is_active, created_at";

const UPSERT_PRODUCT: &str = r#"
    INSERT INTO products (
        id, shop_id, barcode, name, search_key, price, cost_price,
        stock_quantity, image, is_active, created_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
    ON CONFLICT(id) DO UPDATE SET
        shop_id = excluded.shop_id,
        barcode = excluded.barcode,
        name = excluded.name,
        search_key = excluded.search_key,
        price = excluded.price,
        cost_price = excluded.cost_price,
        stock_quantity = excluded.stock_quantity,
        image = excluded.image,
        is_active = excluded.is_active,
        created_at = COALESCE(excluded.created_at, products.created_at)
"#;

#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    shop_id: String,
    barcode: Option<String>,
    name: String,
    price: i64,
    cost_price: i64,
    stock_quantity: i64,
    image: Option<String>,
    is_active: bool,
    created_at: Option<String>,
}

impl ProductRow {
    fn into_product(self) -> DbResult<Product> {
        let created_at = self
            .created_at
            .as_deref()
            .map(|raw| decode_timestamp("products.created_at", raw))
            .transpose()?;

        Ok(Product {
            id: self.id,
            shop_id: self.shop_id,
            barcode: self.barcode,
            name: self.name,
            price: self.price,
            cost_price: self.cost_price,
            stock_quantity: self.stock_quantity,
            image: self.image,
            is_active: self.is_active,
            created_at,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> DbResult<Vec<Product>> {
    rows.into_iter().map(ProductRow::into_product).collect()
}

/// Repository for the product cache table.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts or overwrites one product, recomputing `search_key`. A blank
    /// barcode is stored as NULL.
    ///
    /// ## Errors
    /// `UniqueViolation` if another product already holds the barcode.
    pub async fn put(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, barcode = ?product.barcode, "Upserting product");

        sqlx::query(UPSERT_PRODUCT)
            .bind(&product.id)
            .bind(&product.shop_id)
            .bind(product.barcode_key())
            .bind(&product.name)
            .bind(product.search_key())
            .bind(product.price)
            .bind(product.cost_price)
            .bind(product.stock_quantity)
            .bind(&product.image)
            .bind(product.is_active)
            .bind(product.created_at.map(encode_timestamp))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Gets a product by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ProductRow::into_product).transpose()
    }

    /// Deletes a product by id. Returns whether a row was removed.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Exact barcode lookup through the unique barcode index.
    pub async fn find_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE barcode = ?1", PRODUCT_COLUMNS);
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ProductRow::into_product).transpose()
    }

    /// Ordered scan over the recency index.
    ///
    /// Products without a creation time sort last when scanning newest first.
    pub async fn scan_by_created_at(
        &self,
        direction: ScanDirection,
        limit: u32,
    ) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products ORDER BY created_at {}, name ASC LIMIT ?1",
            PRODUCT_COLUMNS,
            direction.as_sql()
        );
        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        into_products(rows)
    }

    /// Substring search on the lowercased name or on the barcode.
    ///
    /// An empty (or whitespace) query returns the newest products.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.scan_by_created_at(ScanDirection::Descending, limit).await;
        }

        let sql = format!(
            "SELECT {} FROM products \
             WHERE instr(search_key, ?1) > 0 OR instr(barcode, ?2) > 0 \
             ORDER BY created_at DESC, name ASC \
             LIMIT ?3",
            PRODUCT_COLUMNS
        );
        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(query.to_lowercase())
            .bind(query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Search returned products");
        into_products(rows)
    }

    /// Atomically replaces the whole table with `products`.
    ///
    /// ## Atomicity
    /// ```text
    /// BEGIN
    ///   DELETE FROM products
    ///   INSERT × n          ── any failure ──► ROLLBACK, old cache intact
    /// COMMIT
    /// ```
    pub async fn replace_all(&self, products: &[Product]) -> DbResult<usize> {
        debug!(count = products.len(), "Replacing product cache");

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM products").execute(&mut *tx).await?;

        for product in products {
            sqlx::query(UPSERT_PRODUCT)
                .bind(&product.id)
                .bind(&product.shop_id)
                .bind(product.barcode_key())
                .bind(&product.name)
                .bind(product.search_key())
                .bind(product.price)
                .bind(product.cost_price)
                .bind(product.stock_quantity)
                .bind(&product.image)
                .bind(product.is_active)
                .bind(product.created_at.map(encode_timestamp))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(products.len())
    }

    /// Counts cached products.
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
    use super::*;
    use crate::error::DbError;
    use crate::{Database, DbConfig};
    use chrono::{Duration, TimeZone, Utc};

    fn product(id: &str, name: &str, barcode: Option<&str>, age_minutes: i64) -> Product {
        let base = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap();
        Product {
            id: id.to_string(),
            shop_id: "shop-1".to_string(),
            barcode: barcode.map(str::to_string),
            name: name.to_string(),
            price: 10000,
            cost_price: 7000,
            stock_quantity: 5,
            image: None,
            is_active: true,
            created_at: Some(base - Duration::minutes(age_minutes)),
        }
    }

    async fn repo() -> ProductRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().products()
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let repo = repo().await;
        let p = product("p1", "Coca Cola 330ml", Some("8935049500001"), 0);

        repo.put(&p).await.unwrap();
        assert_eq!(repo.get("p1").await.unwrap(), Some(p.clone()));

        let mut edited = p.clone();
        edited.price = 12000;
        repo.put(&edited).await.unwrap();
        assert_eq!(repo.get("p1").await.unwrap().unwrap().price, 12000);
        assert_eq!(repo.count().await.unwrap(), 1);

        assert!(repo.delete("p1").await.unwrap());
        assert!(!repo.delete("p1").await.unwrap());
        assert_eq!(repo.get("p1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_barcode_is_unique() {
        let repo = repo().await;
        repo.put(&product("p1", "A", Some("111"), 0)).await.unwrap();

        let err = repo.put(&product("p2", "B", Some("111"), 0)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // products without barcode never collide
        repo.put(&product("p3", "C", None, 0)).await.unwrap();
        repo.put(&product("p4", "D", None, 0)).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_blank_barcodes_do_not_collide() {
        let repo = repo().await;
        let fresh = vec![
            product("c", "Có mã", Some("893"), 0),
            product("b1", "Không mã 1", Some(""), 1),
            product("b2", "Không mã 2", Some("   "), 2),
        ];
        assert_eq!(repo.replace_all(&fresh).await.unwrap(), 3);
        assert_eq!(repo.get("b1").await.unwrap().unwrap().barcode, None);

        repo.put(&product("b3", "Không mã 3", Some(""), 3)).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 4);
        assert_eq!(repo.find_by_barcode("").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_by_barcode() {
        let repo = repo().await;
        assert_eq!(repo.find_by_barcode("QUICK-123456").await.unwrap(), None);

        repo.put(&product("p1", "A", Some("QUICK-123456"), 0)).await.unwrap();
        let found = repo.find_by_barcode("QUICK-123456").await.unwrap().unwrap();
        assert_eq!(found.id, "p1");
        assert_eq!(repo.find_by_barcode("QUICK-12345").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_search_matches_name_case_insensitive_or_barcode() {
        let repo = repo().await;
        repo.put(&product("p1", "Coca Cola", Some("893001"), 3)).await.unwrap();
        repo.put(&product("p2", "Pepsi", Some("893002"), 2)).await.unwrap();
        repo.put(&product("p3", "Nước COCA lon", None, 1)).await.unwrap();

        let hits: Vec<String> = repo
            .search("  coca ", 50)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(hits, vec!["p3", "p1"]);

        let by_barcode = repo.search("3002", 50).await.unwrap();
        assert_eq!(by_barcode.len(), 1);
        assert_eq!(by_barcode[0].id, "p2");

        assert!(repo.search("100%", 50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_search_returns_newest_first_capped() {
        let repo = repo().await;
        for i in 0..60 {
            repo.put(&product(&format!("p{}", i), &format!("Item {}", i), None, i))
                .await
                .unwrap();
        }

        let page = repo.search("   ", 50).await.unwrap();
        assert_eq!(page.len(), 50);
        assert_eq!(page[0].id, "p0");
        assert_eq!(page[49].id, "p49");
    }

    #[tokio::test]
    async fn test_replace_all_swaps_whole_cache() {
        let repo = repo().await;
        repo.put(&product("old", "Old item", Some("1"), 0)).await.unwrap();

        let fresh = vec![
            product("n1", "New one", Some("1"), 0),
            product("n2", "New two", Some("2"), 1),
        ];
        assert_eq!(repo.replace_all(&fresh).await.unwrap(), 2);

        assert_eq!(repo.get("old").await.unwrap(), None);
        assert_eq!(repo.find_by_barcode("1").await.unwrap().unwrap().id, "n1");
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_replace_all_failure_keeps_old_cache() {
        let repo = repo().await;
        repo.put(&product("old1", "Old one", Some("A"), 0)).await.unwrap();
        repo.put(&product("old2", "Old two", Some("B"), 1)).await.unwrap();

        // second insert violates the barcode index half way through
        let broken = vec![
            product("n1", "New one", Some("X"), 0),
            product("n2", "New two", Some("X"), 1),
            product("n3", "New three", Some("Z"), 2),
        ];
        let err = repo.replace_all(&broken).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        let all: Vec<String> = repo
            .search("", 50)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(all, vec!["old1", "old2"]);
        assert_eq!(repo.find_by_barcode("X").await.unwrap(), None);
    }
}

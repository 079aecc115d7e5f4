//! # Sale Queue Repository
//!
//! The `sales_queue` table: every sale captured on this device.
//!
//! ## Queue Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Offline-First Sale Capture                          │
//! │                                                                         │
//! │  1. CHECKOUT                                                           │
//! │     INSERT INTO sales_queue (..., synced = 0)   ← never needs network  │
//! │                                                                         │
//! │  2. PUSH PASS (shoppos-sync)                                           │
//! │     SELECT ... WHERE synced = 0                 ← idx_sales_queue_synced│
//! │         │                                                               │
//! │         ├── remote accepted ──► UPDATE synced = 1 WHERE synced = 0     │
//! │         └── remote failed   ──► row untouched, retried next pass       │
//! │                                                                         │
//! │  3. HISTORY                                                            │
//! │     SELECT ... ORDER BY created_at DESC LIMIT n ← idx_sales_queue_created_at
//! │                                                                         │
//! │  4. MAINTENANCE (explicit only)                                        │
//! │     DELETE ... WHERE synced = 1                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{decode_date, decode_timestamp, encode_timestamp, ScanDirection};
use shoppos_core::{NewSale, PaymentMethod, QueuedSale, SaleLine};

const SALE_COLUMNS: &str = "local_id, client_ref, shop_id, code, total_amount, payment_method, \
                            sale_date, sale_local_date, items, synced, created_at, synced_at";

#[derive(Debug, FromRow)]
struct QueuedSaleRow {
    local_id: i64,
    client_ref: String,
    shop_id: String,
    code: String,
    total_amount: i64,
    payment_method: PaymentMethod,
    sale_date: String,
    sale_local_date: String,
    items: String,
    synced: bool,
    created_at: String,
    synced_at: Option<String>,
}

impl QueuedSaleRow {
    fn into_sale(self) -> DbResult<QueuedSale> {
        let items: Vec<SaleLine> =
            serde_json::from_str(&self.items).map_err(|e| DbError::corrupt("items", e))?;

        Ok(QueuedSale {
            local_id: self.local_id,
            client_ref: self.client_ref,
            shop_id: self.shop_id,
            code: self.code,
            total_amount: self.total_amount,
            payment_method: self.payment_method,
            sale_date: decode_timestamp("sale_date", &self.sale_date)?,
            sale_local_date: decode_date("sale_local_date", &self.sale_local_date)?,
            items,
            synced: self.synced,
            created_at: decode_timestamp("created_at", &self.created_at)?,
            synced_at: self
                .synced_at
                .as_deref()
                .map(|raw| decode_timestamp("synced_at", raw))
                .transpose()?,
        })
    }
}

fn into_sales(rows: Vec<QueuedSaleRow>) -> DbResult<Vec<QueuedSale>> {
    rows.into_iter().map(QueuedSaleRow::into_sale).collect()
}

/// Repository for the sale queue table.
#[derive(Debug, Clone)]
pub struct SaleQueueRepository {
    pool: SqlitePool,
}

impl SaleQueueRepository {
    /// Creates a new SaleQueueRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleQueueRepository { pool }
    }

    /// Appends a sale with `synced = 0`, stamped with `created_at`.
    ///
    /// ## Returns
    /// The stored record, including its new `local_id`.
    ///
    /// ## Errors
    /// - `StorageUnavailable` if the store cannot be written
    /// - `UniqueViolation` if this `client_ref` is already queued
    pub async fn insert(&self, sale: &NewSale, created_at: DateTime<Utc>) -> DbResult<QueuedSale> {
        let items = serde_json::to_string(sale.items())
            .map_err(|e| DbError::Internal(format!("serialize sale items: {}", e)))?;

        let result = sqlx::query(
            r#"
            INSERT INTO sales_queue (
                client_ref, shop_id, code, total_amount, payment_method,
                sale_date, sale_local_date, items, synced, created_at, synced_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9, NULL)
            "#,
        )
        .bind(sale.client_ref())
        .bind(sale.shop_id())
        .bind(sale.code())
        .bind(sale.total_amount())
        .bind(sale.payment_method())
        .bind(encode_timestamp(sale.sale_date()))
        .bind(sale.sale_local_date().format("%Y-%m-%d").to_string())
        .bind(&items)
        .bind(encode_timestamp(created_at))
        .execute(&self.pool)
        .await?;

        let local_id = result.last_insert_rowid();
        debug!(local_id, code = %sale.code(), "Sale queued");

        Ok(QueuedSale {
            local_id,
            client_ref: sale.client_ref().to_string(),
            shop_id: sale.shop_id().to_string(),
            code: sale.code().to_string(),
            total_amount: sale.total_amount(),
            payment_method: sale.payment_method(),
            sale_date: sale.sale_date(),
            sale_local_date: sale.sale_local_date(),
            items: sale.items().to_vec(),
            synced: false,
            created_at,
            synced_at: None,
        })
    }

    /// Gets a queued sale by its local id.
    pub async fn get(&self, local_id: i64) -> DbResult<Option<QueuedSale>> {
        let sql = format!("SELECT {} FROM sales_queue WHERE local_id = ?1", SALE_COLUMNS);
        let row: Option<QueuedSaleRow> = sqlx::query_as(&sql)
            .bind(local_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(QueuedSaleRow::into_sale).transpose()
    }

    /// Deletes one record. Returns whether a row was removed.
    pub async fn delete(&self, local_id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM sales_queue WHERE local_id = ?1")
            .bind(local_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lookup through the `synced` index, in insertion order.
    pub async fn list_by_synced(&self, synced: bool) -> DbResult<Vec<QueuedSale>> {
        let sql = format!(
            "SELECT {} FROM sales_queue WHERE synced = ?1 ORDER BY local_id ASC",
            SALE_COLUMNS
        );
        let rows: Vec<QueuedSaleRow> = sqlx::query_as(&sql)
            .bind(synced)
            .fetch_all(&self.pool)
            .await?;

        into_sales(rows)
    }

    /// Flips `synced` from 0 to 1.
    ///
    /// Returns `true` only when this call changed the row; an already-synced
    /// or unknown `local_id` returns `false` and leaves everything as is.
    pub async fn mark_synced(&self, local_id: i64, synced_at: DateTime<Utc>) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE sales_queue SET synced = 1, synced_at = ?2 WHERE local_id = ?1 AND synced = 0",
        )
        .bind(local_id)
        .bind(encode_timestamp(synced_at))
        .execute(&self.pool)
        .await?;

        let changed = result.rows_affected() > 0;
        debug!(local_id, changed, "Mark synced");
        Ok(changed)
    }

    /// Ordered scan over the `created_at` index; `local_id` breaks ties.
    pub async fn scan_by_created_at(
        &self,
        direction: ScanDirection,
        limit: u32,
    ) -> DbResult<Vec<QueuedSale>> {
        let dir = direction.as_sql();
        let sql = format!(
            "SELECT {} FROM sales_queue ORDER BY created_at {}, local_id {} LIMIT ?1",
            SALE_COLUMNS, dir, dir
        );
        let rows: Vec<QueuedSaleRow> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        into_sales(rows)
    }

    /// Deletes every synced record. Returns the number removed.
    pub async fn purge_synced(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM sales_queue WHERE synced = 1")
            .execute(&self.pool)
            .await?;

        debug!(removed = result.rows_affected(), "Purged synced sales");
        Ok(result.rows_affected())
    }

    /// Counts records with the given `synced` flag.
    pub async fn count_by_synced(&self, synced: bool) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales_queue WHERE synced = ?1")
            .bind(synced)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

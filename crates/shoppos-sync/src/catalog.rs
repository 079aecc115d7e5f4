//! # Product Cache Manager
//!
//! Read-through cache of the shop's catalog. Filled wholesale from the
//! remote store, read by the till while offline.
//!
//! ## Read/Write Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  WRITES (hard failures)             READS (soft failures)              │
//! │  ──────────────────────             ─────────────────────              │
//! │  refresh_all   one transaction      search          → [] on            │
//! │  upsert_one    single row           find_by_barcode → None  storage    │
//! │  remove        single row                                   failure    │
//! │                                                                         │
//! │  Errors propagate.                  StorageUnavailable is logged at    │
//! │                                     warn and the till keeps selling.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{debug, info, warn};

use shoppos_core::validation::{validate_price, validate_product_name, validate_search_query};
use shoppos_core::Product;
use shoppos_db::{DbError, ProductRepository};

use crate::error::SyncResult;

/// Cache of the shop's products.
#[derive(Debug, Clone)]
pub struct ProductCache {
    repo: ProductRepository,
    search_limit: u32,
}

impl ProductCache {
    pub fn new(repo: ProductRepository) -> Self {
        Self::with_search_limit(repo, shoppos_core::DEFAULT_PAGE_LIMIT)
    }

    pub fn with_search_limit(repo: ProductRepository, search_limit: u32) -> Self {
        ProductCache { repo, search_limit }
    }

    /// Replaces the whole cache with a fresh pull.
    ///
    /// Either every product is written or the previous cache is left exactly
    /// as it was.
    pub async fn refresh_all(&self, products: &[Product]) -> SyncResult<usize> {
        let written = self.repo.replace_all(products).await?;
        info!(count = written, "Product cache refreshed");
        Ok(written)
    }

    /// Inserts or overwrites one product; `search_key` is recomputed.
    pub async fn upsert_one(&self, product: &Product) -> SyncResult<()> {
        validate_product_name(&product.name)?;
        validate_price(product.price)?;

        self.repo.put(product).await?;
        debug!(id = %product.id, "Product cached");
        Ok(())
    }

    /// Exact barcode lookup. `None` when absent or when the store is down.
    pub async fn find_by_barcode(&self, code: &str) -> SyncResult<Option<Product>> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(None);
        }

        soften(self.repo.find_by_barcode(code).await, "find_by_barcode")
    }

    /// Searches with the configured limit.
    pub async fn search(&self, query: &str) -> SyncResult<Vec<Product>> {
        self.search_with_limit(query, self.search_limit).await
    }

    /// Case-insensitive name substring or barcode substring, newest first.
    ///
    /// A blank query returns the newest `limit` products.
    pub async fn search_with_limit(&self, query: &str, limit: u32) -> SyncResult<Vec<Product>> {
        let query = validate_search_query(query)?;
        soften(self.repo.search(&query, limit).await, "search")
    }

    pub async fn get(&self, id: &str) -> SyncResult<Option<Product>> {
        Ok(self.repo.get(id).await?)
    }

    /// Removes one product. Returns whether it was cached.
    pub async fn remove(&self, id: &str) -> SyncResult<bool> {
        Ok(self.repo.delete(id).await?)
    }

    pub async fn count(&self) -> SyncResult<i64> {
        Ok(self.repo.count().await?)
    }
}

/// Maps `StorageUnavailable` on a read to the empty value.
fn soften<T: Default>(result: Result<T, DbError>, op: &'static str) -> SyncResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_storage_unavailable() => {
            warn!(op, error = %e, "Product cache unreadable, returning empty result");
            Ok(T::default())
        }
        Err(e) => Err(e.into()),
    }
}

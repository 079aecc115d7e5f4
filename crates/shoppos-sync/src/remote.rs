//! # Remote Store Contract
//!
//! What the sync layer needs from the authoritative backend: row insert,
//! filtered select and filtered update on a fixed set of tables.
//!
//! ## Row Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  QueuedSale (local)                 remote                              │
//! │  ──────────────────                 ──────                              │
//! │  local_id        ── never sent ──                                       │
//! │  client_ref ─┐                                                          │
//! │  shop_id     │                                                          │
//! │  code        ├──► sales        { id (remote), ..., created_by }         │
//! │  total ...   ┘                    │                                     │
//! │  items[] ────────► sale_items     { sale_id ─┘, product_id, quantity,   │
//! │                                     price, product_name }               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use shoppos_core::{PaymentMethod, Product, QueuedSale, SaleLine};

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Tables
// =============================================================================

/// Tables exposed by the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteTable {
    Shops,
    Products,
    Sales,
    SaleItems,
    CashFlows,
    Imports,
    InventoryLogs,
}

impl RemoteTable {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RemoteTable::Shops => "shops",
            RemoteTable::Products => "products",
            RemoteTable::Sales => "sales",
            RemoteTable::SaleItems => "sale_items",
            RemoteTable::CashFlows => "cash_flows",
            RemoteTable::Imports => "imports",
            RemoteTable::InventoryLogs => "inventory_logs",
        }
    }
}

impl fmt::Display for RemoteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Queries
// =============================================================================

/// Equality filter `column = value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter {
            column: column.into(),
            value: value.into(),
        }
    }

    /// True when `row[column]` equals the filter value.
    pub fn matches(&self, row: &Value) -> bool {
        row.get(&self.column) == Some(&self.value)
    }
}

/// Sort order for a select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Select parameters: equality filters, optional order and limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteQuery {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<u32>,
}

impl RemoteQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

// =============================================================================
// Remote Store Trait
// =============================================================================

/// Authenticated CRUD on the remote tables.
///
/// Session and credentials are the implementation's concern. Every method
/// returns the affected rows as JSON objects, remote `id` included.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Inserts `rows` in one request; all or nothing.
    async fn insert(&self, table: RemoteTable, rows: Vec<Value>) -> SyncResult<Vec<Value>>;

    /// Selects rows matching `query`.
    async fn select(&self, table: RemoteTable, query: &RemoteQuery) -> SyncResult<Vec<Value>>;

    /// Applies `patch` to every row matching all `filters`.
    async fn update(
        &self,
        table: RemoteTable,
        filters: &[Filter],
        patch: Value,
    ) -> SyncResult<Vec<Value>>;
}

/// Reads the `id` column of a returned row (text or integer).
pub fn row_id(row: &Value) -> SyncResult<String> {
    match row.get("id") {
        Some(Value::String(id)) => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(SyncError::InvalidResponse(format!(
            "row without id: {}",
            row
        ))),
    }
}

// =============================================================================
// Wire Shapes
// =============================================================================

/// A `sales` row as inserted by the push pass.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteSaleHeader<'a> {
    pub shop_id: &'a str,
    pub client_ref: &'a str,
    pub code: &'a str,
    pub total_amount: i64,
    pub payment_method: PaymentMethod,
    pub sale_date: DateTime<Utc>,
    pub sale_local_date: NaiveDate,
    pub created_by: &'a str,
}

impl<'a> RemoteSaleHeader<'a> {
    pub fn from_queued(sale: &'a QueuedSale, created_by: &'a str) -> Self {
        RemoteSaleHeader {
            shop_id: &sale.shop_id,
            client_ref: &sale.client_ref,
            code: &sale.code,
            total_amount: sale.total_amount,
            payment_method: sale.payment_method,
            sale_date: sale.sale_date,
            sale_local_date: sale.sale_local_date,
            created_by,
        }
    }
}

/// A `sale_items` row.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteSaleItem<'a> {
    pub sale_id: &'a str,
    pub product_id: &'a str,
    pub quantity: i64,
    pub price: i64,
    pub product_name: &'a str,
}

impl<'a> RemoteSaleItem<'a> {
    pub fn from_line(sale_id: &'a str, line: &'a SaleLine) -> Self {
        RemoteSaleItem {
            sale_id,
            product_id: &line.product_id,
            quantity: line.quantity,
            price: line.price,
            product_name: &line.product_name,
        }
    }
}

/// A `products` row. `search_key` is local-only and never sent.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteProduct<'a> {
    pub id: &'a str,
    pub shop_id: &'a str,
    pub barcode: Option<&'a str>,
    pub name: &'a str,
    pub price: i64,
    pub cost_price: i64,
    pub stock_quantity: i64,
    pub image: Option<&'a str>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl<'a> RemoteProduct<'a> {
    /// Borrows `product`, re-homing it to `shop_id`.
    pub fn new(product: &'a Product, shop_id: &'a str) -> Self {
        RemoteProduct {
            id: &product.id,
            shop_id,
            barcode: product.barcode.as_deref(),
            name: &product.name,
            price: product.price,
            cost_price: product.cost_price,
            stock_quantity: product.stock_quantity,
            image: product.image.as_deref(),
            is_active: product.is_active,
            created_at: product.created_at,
        }
    }
}

/// Serializes a wire struct into a JSON row.
pub fn to_row<T: Serialize>(value: &T) -> SyncResult<Value> {
    Ok(serde_json::to_value(value)?)
}

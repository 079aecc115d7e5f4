//! # Domain Types
//!
//! Core domain types used throughout the shop POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────────┐   ┌─────────────────┐   │
//! │  │    Product      │   │     QueuedSale      │   │   SaleLine      │   │
//! │  │  ─────────────  │   │  ─────────────────  │   │  ─────────────  │   │
//! │  │  id (remote)    │   │  local_id (local)   │   │  product_id     │   │
//! │  │  barcode        │   │  client_ref (UUID)  │   │  product_name   │   │
//! │  │  name           │   │  code  "HD-xxxxxx"  │   │  quantity       │   │
//! │  │  price          │   │  total_amount       │   │  price          │   │
//! │  │  search_key()   │   │  synced             │   └─────────────────┘   │
//! │  └─────────────────┘   │  items: [SaleLine]  │                          │
//! │                        └─────────────────────┘   ┌─────────────────┐   │
//! │                                                   │ PaymentMethod   │   │
//! │                                                   │  Cash           │   │
//! │                                                   │  Transfer       │   │
//! │                                                   └─────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! - `Product.id` is assigned by the remote store (or a UUID for quick-sale items).
//! - `QueuedSale.local_id` belongs to the local queue only and never leaves the device.
//! - `QueuedSale.client_ref` is a UUID generated at checkout; it is the key the
//!   remote side is reconciled on. `code` is for humans and is NOT unique.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;
use crate::QUICK_SALE_DEFAULT_NAME;

// =============================================================================
// Product
// =============================================================================

/// A product as cached on the device.
///
/// Deserializes straight from a remote `products` row; columns the remote
/// table may leave null fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Remote-assigned identifier.
    pub id: String,

    /// Shop this product belongs to.
    pub shop_id: String,

    /// Barcode, unique within the shop when present. Blank reads as none.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub barcode: Option<String>,

    /// Display name.
    pub name: String,

    /// Selling price in whole currency units.
    pub price: i64,

    /// Purchase price in whole currency units.
    #[serde(default, deserialize_with = "null_as_default")]
    pub cost_price: i64,

    /// Stock on hand. Expected to be >= 0, not enforced locally.
    #[serde(default, deserialize_with = "null_as_default")]
    pub stock_quantity: i64,

    /// Optional inline image (base64).
    #[serde(default)]
    pub image: Option<String>,

    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub is_active: bool,

    /// Creation instant; drives the recency order of an empty search.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(normalize_barcode(Option::<String>::deserialize(deserializer)?.as_deref()))
}

/// Trims a barcode; blank becomes `None` so barcode-less products never
/// collide on the unique index.
pub fn normalize_barcode(barcode: Option<&str>) -> Option<String> {
    barcode
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
}

fn null_as_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

impl Product {
    /// Lowercased name used for local substring search.
    ///
    /// Recomputed on every cache write, never read back from the remote.
    pub fn search_key(&self) -> String {
        self.name.to_lowercase()
    }

    /// Barcode as stored in the cache: trimmed, blank as `None`.
    pub fn barcode_key(&self) -> Option<String> {
        normalize_barcode(self.barcode.as_deref())
    }

    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_units(self.price)
    }

    /// Builds an ad-hoc product for an item that is not in the catalog.
    ///
    /// ## Quick Sale Workflow
    /// ```text
    /// Cashier types name + price ──► quick_sale() ──► Cart
    ///                                     │
    ///                                     └──► (optional) ProductCache::upsert_one
    /// ```
    ///
    /// The barcode is `QUICK-` plus the last 6 digits of the epoch
    /// milliseconds; stock starts at 0. A blank name becomes
    /// [`QUICK_SALE_DEFAULT_NAME`].
    pub fn quick_sale(shop_id: &str, name: &str, price: i64, now: DateTime<Utc>) -> Self {
        let name = name.trim();
        let name = if name.is_empty() {
            QUICK_SALE_DEFAULT_NAME
        } else {
            name
        };

        Product {
            id: Uuid::new_v4().to_string(),
            shop_id: shop_id.to_string(),
            barcode: Some(quick_sale_barcode(now)),
            name: name.to_string(),
            price,
            cost_price: 0,
            stock_quantity: 0,
            image: None,
            is_active: true,
            created_at: Some(now),
        }
    }
}

/// `QUICK-` + last 6 digits of the epoch milliseconds.
pub fn quick_sale_barcode(now: DateTime<Utc>) -> String {
    format!("QUICK-{:06}", now.timestamp_millis().rem_euclid(1_000_000))
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Bank transfer / QR payment.
    Transfer,
}

impl PaymentMethod {
    /// Wire and storage representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Transfer => "transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "transfer" => Ok(PaymentMethod::Transfer),
            other => Err(ValidationError::InvalidFormat {
                field: "payment_method".to_string(),
                reason: format!("unknown method '{}', expected cash or transfer", other),
            }),
        }
    }
}

// =============================================================================
// Sale Line
// =============================================================================

/// A line of a queued sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLine {
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    pub quantity: i64,
    /// Unit price at time of sale (frozen).
    pub price: i64,
}

impl SaleLine {
    /// `price × quantity`, or `None` on overflow.
    pub fn line_total(&self) -> Option<Money> {
        Money::from_units(self.price).checked_mul_quantity(self.quantity)
    }
}

// =============================================================================
// Queued Sale
// =============================================================================

/// A sale as persisted in the local queue.
///
/// ## Lifecycle
/// ```text
/// checkout ──► enqueue (synced=false) ──► push pass ──► mark_synced (synced=true)
///                                                           │
///                                              purge_synced ◄┘  (explicit only)
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QueuedSale {
    /// Local autoincrement key, owned by the local store.
    pub local_id: i64,
    /// Client-generated UUID; remote idempotency key.
    pub client_ref: String,
    pub shop_id: String,
    /// Human-readable reference. Not unique.
    pub code: String,
    pub total_amount: i64,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    /// Calendar date under the fixed UTC+7 offset, computed at checkout.
    #[ts(as = "String")]
    pub sale_local_date: NaiveDate,
    pub items: Vec<SaleLine>,
    pub synced: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub synced_at: Option<DateTime<Utc>>,
}

impl QueuedSale {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_units(self.total_amount)
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        !self.synced
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

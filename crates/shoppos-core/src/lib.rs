//! # shoppos-core: Pure Business Logic for the Shop POS
//!
//! Everything the offline sale path needs that does not touch a disk, a
//! socket or the system clock lives here.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shop POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               Presentation layer (out of tree)                  │   │
//! │  │    Catalog ──► Cart ──► Checkout ──► History / Void             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ shoppos-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   cart    │  │ assembly  │  │ validation│  │   │
//! │  │   │  Product  │  │   Cart    │  │  NewSale  │  │   rules   │  │   │
//! │  │   │ QueuedSale│  │  CartLine │  │  UTC+7    │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │         shoppos-db (local store) ──► shoppos-sync (engine)      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, QueuedSale, SaleLine, PaymentMethod)
//! - [`money`] - Integer money in whole currency units
//! - [`cart`] - In-memory cart state
//! - [`assembly`] - Cart → `NewSale`, business date, sale code
//! - [`receipt`] - Human-facing receipt code formatting
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use shoppos_core::{assemble_sale, Cart, PaymentMethod, Product};
//!
//! let now = Utc.with_ymd_and_hms(2026, 1, 31, 18, 30, 0).unwrap();
//! let tea = Product::quick_sale("shop-1", "Trà đá", 5000, now);
//!
//! let mut cart = Cart::new();
//! cart.add_product(&tea).unwrap();
//! cart.add_product(&tea).unwrap();
//!
//! let sale = assemble_sale("shop-1", &cart, PaymentMethod::Cash, now).unwrap();
//! assert_eq!(sale.total_amount(), 10_000);
//! assert_eq!(sale.sale_local_date().to_string(), "2026-02-01");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod assembly;
pub mod cart;
pub mod error;
pub mod money;
pub mod receipt;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use assembly::{assemble_sale, generate_sale_code, local_business_date, NewSale};
pub use cart::{Cart, CartLine};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and keeps one queued sale a reasonable size for a
/// single remote items insert.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line in the cart.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Fixed reporting offset of the shop, in seconds east of UTC (UTC+7).
///
/// This is a fixed offset, not an IANA zone. Reports bucket sales by the
/// calendar date under this offset.
pub const BUSINESS_UTC_OFFSET_SECS: i32 = 7 * 3600;

/// Default page size for catalog search and sales history.
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// Name used for a quick-sale item when the cashier leaves it blank.
pub const QUICK_SALE_DEFAULT_NAME: &str = "Khách lẻ";

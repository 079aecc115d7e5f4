//! # Checkout
//!
//! Turns the cart into a queued sale and nudges the engine.
//!
//! ```text
//! Cart ──► assemble_sale ──► SaleQueue::enqueue ──► request_push ──► clear cart
//!                                  │
//!                                  └─ StorageUnavailable: returned, cart kept
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use shoppos_core::receipt::format_receipt_code;
use shoppos_core::validation::{validate_price, validate_quantity};
use shoppos_core::{assemble_sale, Cart, PaymentMethod, Product};

use crate::engine::SyncEngine;
use crate::error::SyncResult;

/// What the cashier sees after a completed checkout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutReceipt {
    pub local_id: i64,
    pub client_ref: String,
    pub code: String,
    /// Printed form of `code`.
    pub receipt_code: String,
    pub total_amount: i64,
    pub payment_method: PaymentMethod,
    pub sale_local_date: NaiveDate,
}

/// Completes a checkout at the current instant.
pub async fn checkout(
    engine: &SyncEngine,
    cart: &mut Cart,
    method: PaymentMethod,
) -> SyncResult<CheckoutReceipt> {
    checkout_at(engine, cart, method, Utc::now()).await
}

/// Completes a checkout at `now`.
///
/// The cart is cleared only once the sale is durably queued. Any local
/// failure leaves the cart untouched and is returned; no push is requested.
pub async fn checkout_at(
    engine: &SyncEngine,
    cart: &mut Cart,
    method: PaymentMethod,
    now: DateTime<Utc>,
) -> SyncResult<CheckoutReceipt> {
    let sale = assemble_sale(engine.shop_id(), cart, method, now)?;
    let queued = engine.queue().enqueue(&sale).await?;

    engine.request_push();
    cart.clear();

    info!(
        local_id = queued.local_id,
        code = %queued.code,
        total = queued.total_amount,
        "Checkout completed"
    );

    Ok(CheckoutReceipt {
        local_id: queued.local_id,
        receipt_code: format_receipt_code(&queued.code),
        client_ref: queued.client_ref,
        code: queued.code,
        total_amount: queued.total_amount,
        payment_method: queued.payment_method,
        sale_local_date: queued.sale_local_date,
    })
}

// =============================================================================
// Quick Sale
// =============================================================================

/// An item sold without a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickSaleItem {
    /// Blank becomes the walk-in default name.
    pub name: String,
    /// Whole units, or thousands when typed as 1..=999.
    pub price: i64,
    pub quantity: i64,
    /// Also cache the product locally for later scans.
    pub save_to_catalog: bool,
}

/// Cashiers type `25` for 25 000; amounts below a thousand are shorthand.
pub fn expand_price_shorthand(price: i64) -> i64 {
    if (1..1000).contains(&price) {
        price * 1000
    } else {
        price
    }
}

/// Builds an ad-hoc product and puts `item.quantity` of it in the cart.
///
/// Saving to the catalog is best effort: a failed cache write is logged
/// and the sale goes on.
pub async fn add_quick_sale(
    engine: &SyncEngine,
    cart: &mut Cart,
    item: &QuickSaleItem,
    now: DateTime<Utc>,
) -> SyncResult<Product> {
    let price = expand_price_shorthand(item.price);
    validate_price(price)?;
    validate_quantity(item.quantity)?;

    let product = Product::quick_sale(engine.shop_id(), &item.name, price, now);

    if item.save_to_catalog {
        if let Err(e) = engine.cache().upsert_one(&product).await {
            warn!(error = %e, name = %product.name, "Quick-sale product not cached");
        }
    }

    cart.add_product(&product)?;
    cart.set_quantity(&product.id, item.quantity)?;
    Ok(product)
}

//! # Sale Assembly
//!
//! Turns the cart into a [`NewSale`] ready for the local queue.
//!
//! ```text
//! Cart + PaymentMethod + now
//!        │
//!        ▼
//! assemble_sale()
//!   ├── total_amount    = Σ price × quantity   (exact, integer)
//!   ├── sale_date       = now
//!   ├── sale_local_date = (now + 7h).date      (fixed offset, not a zone)
//!   ├── code            = "HD-" + last 6 digits of epoch seconds
//!   └── client_ref      = UUID v4              (remote idempotency key)
//!        │
//!        ▼
//! NewSale::new()  ── re-checks the sum invariant
//! ```
//!
//! `code` collides for two sales in the same second modulo 10^6 seconds.
//! Nothing downstream keys on it; `client_ref` is the unique reference.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PaymentMethod, SaleLine};
use crate::validation::{validate_price, validate_quantity, validate_required, validate_uuid};
use crate::BUSINESS_UTC_OFFSET_SECS;

/// Calendar date of `instant` under the shop's fixed UTC+7 reporting offset.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use shoppos_core::local_business_date;
///
/// let instant = Utc.with_ymd_and_hms(2026, 1, 31, 18, 30, 0).unwrap();
/// assert_eq!(local_business_date(instant).to_string(), "2026-02-01");
/// ```
pub fn local_business_date(instant: DateTime<Utc>) -> NaiveDate {
    (instant + Duration::seconds(i64::from(BUSINESS_UTC_OFFSET_SECS))).date_naive()
}

/// Human-readable sale code: `HD-` + last 6 digits of the epoch seconds.
pub fn generate_sale_code(now: DateTime<Utc>) -> String {
    format!("HD-{:06}", now.timestamp().rem_euclid(1_000_000))
}

/// A validated sale that has not been queued yet.
///
/// The only constructor is [`NewSale::new`], which enforces
/// `total_amount == Σ price × quantity`; the queue accepts nothing else.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSale {
    client_ref: String,
    shop_id: String,
    code: String,
    total_amount: i64,
    payment_method: PaymentMethod,
    sale_date: DateTime<Utc>,
    sale_local_date: NaiveDate,
    items: Vec<SaleLine>,
}

impl NewSale {
    /// Validates and builds a sale.
    ///
    /// ## Errors
    /// - `EmptyCart` if `items` is empty
    /// - `Validation` for a blank shop, bad `client_ref`, bad quantity or negative price
    /// - `AmountOverflow` if the line sum does not fit in i64
    /// - `TotalMismatch` if `total_amount` differs from the line sum
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client_ref: String,
        shop_id: String,
        code: String,
        total_amount: i64,
        payment_method: PaymentMethod,
        sale_date: DateTime<Utc>,
        sale_local_date: NaiveDate,
        items: Vec<SaleLine>,
    ) -> CoreResult<Self> {
        validate_required("shop_id", &shop_id)?;
        validate_required("code", &code)?;
        validate_uuid(&client_ref)?;

        if items.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let mut computed = Money::zero();
        for line in &items {
            validate_quantity(line.quantity)?;
            validate_price(line.price)?;
            computed = line
                .line_total()
                .and_then(|t| computed.checked_add(t))
                .ok_or_else(|| CoreError::AmountOverflow {
                    context: format!("sale {}", code),
                })?;
        }

        if computed.units() != total_amount {
            return Err(CoreError::TotalMismatch {
                declared: total_amount,
                computed: computed.units(),
            });
        }

        Ok(NewSale {
            client_ref,
            shop_id,
            code,
            total_amount,
            payment_method,
            sale_date,
            sale_local_date,
            items,
        })
    }

    pub fn client_ref(&self) -> &str {
        &self.client_ref
    }

    pub fn shop_id(&self) -> &str {
        &self.shop_id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn total_amount(&self) -> i64 {
        self.total_amount
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn sale_date(&self) -> DateTime<Utc> {
        self.sale_date
    }

    pub fn sale_local_date(&self) -> NaiveDate {
        self.sale_local_date
    }

    pub fn items(&self) -> &[SaleLine] {
        &self.items
    }
}

/// Builds a [`NewSale`] from the cart at instant `now`.
///
/// ## Checkout Workflow
/// ```text
/// Cashier presses "Pay" (cash | transfer)
///      │
///      ▼
/// assemble_sale() ← THIS FUNCTION
///      │
///      ▼
/// SaleQueue::enqueue()   (local, never touches the network)
///      │
///      ▼
/// SyncEngine::request_push()   (fire and forget)
/// ```
pub fn assemble_sale(
    shop_id: &str,
    cart: &Cart,
    payment_method: PaymentMethod,
    now: DateTime<Utc>,
) -> CoreResult<NewSale> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let total = cart.total_amount()?;
    let items = cart.lines().iter().map(|l| l.to_sale_line()).collect();

    NewSale::new(
        Uuid::new_v4().to_string(),
        shop_id.to_string(),
        generate_sale_code(now),
        total.units(),
        payment_method,
        now,
        local_business_date(now),
        items,
    )
}

// =============================================================================
// Unit Tests
// =============================================================================

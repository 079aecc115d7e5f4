//! # Cart
//!
//! In-memory cart state, owned by the presentation layer between checkouts.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Scan / tap product ────► add_product()      ──► qty + 1 (or new line) │
//! │  + / - buttons ─────────► change_quantity()  ──► qty ± n, drop at 0    │
//! │  Type a quantity ───────► set_quantity()     ──► qty = n, drop at 0    │
//! │  Remove line ───────────► remove()                                     │
//! │  Checkout done ─────────► clear()                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines freeze the product's name and price at the moment they are added.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Product, SaleLine};
use crate::validation::validate_cart_size;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    /// Product name at time of adding (frozen).
    pub name: String,
    /// Unit price at time of adding (frozen).
    pub price: i64,
    pub quantity: i64,
}

impl CartLine {
    /// Creates a line for one unit of `product`.
    pub fn from_product(product: &Product) -> Self {
        CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            quantity: 1,
        }
    }

    /// Unit price × quantity, or `None` on overflow.
    pub fn line_total(&self) -> Option<Money> {
        Money::from_units(self.price).checked_mul_quantity(self.quantity)
    }

    /// Snapshot of this line as stored on a queued sale.
    pub fn to_sale_line(&self) -> SaleLine {
        SaleLine {
            product_id: self.product_id.clone(),
            product_name: self.name.clone(),
            quantity: self.quantity,
            price: self.price,
        }
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding the same product increments)
/// - Every line has quantity in `1..=MAX_ITEM_QUANTITY`
/// - At most `MAX_CART_ITEMS` lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds one unit of `product`, merging with an existing line.
    pub fn add_product(&mut self, product: &Product) -> CoreResult<()> {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            let requested = line.quantity + 1;
            if requested > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            line.quantity = requested;
            return Ok(());
        }

        validate_cart_size(self.lines.len()).map_err(|_| CoreError::CartTooLarge {
            max: MAX_CART_ITEMS,
        })?;

        self.lines.push(CartLine::from_product(product));
        Ok(())
    }

    /// Changes a line's quantity by `delta`; the line is removed when the
    /// result drops to zero or below.
    pub fn change_quantity(&mut self, product_id: &str, delta: i64) -> CoreResult<()> {
        let current = self
            .lines
            .iter()
            .find(|l| l.product_id == product_id)
            .map(|l| l.quantity)
            .ok_or_else(|| CoreError::ProductNotInCart(product_id.to_string()))?;

        self.set_quantity(product_id, current.saturating_add(delta))
    }

    /// Sets a line's quantity; zero or below removes the line.
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return self.remove(product_id);
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                line.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::ProductNotInCart(product_id.to_string())),
        }
    }

    /// Removes a line by product id.
    pub fn remove(&mut self, product_id: &str) -> CoreResult<()> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);

        if self.lines.len() == before {
            Err(CoreError::ProductNotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Exact sum of `price × quantity`; `AmountOverflow` if it does not fit.
    pub fn total_amount(&self) -> CoreResult<Money> {
        self.lines.iter().try_fold(Money::zero(), |acc, line| {
            line.line_total()
                .and_then(|t| acc.checked_add(t))
                .ok_or_else(|| CoreError::AmountOverflow {
                    context: "cart total".to_string(),
                })
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Whole Currency Units
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The shop prices in a currency with no fractional unit (VND).           │
//! │                                                                         │
//! │    price 5000 × qty 3 = 15000      exact, no rounding anywhere          │
//! │                                                                         │
//! │  Local and remote totals must reconcile to the unit, so the only       │
//! │  operations offered are integer add / multiply, both overflow-checked  │
//! │  where the inputs come from a cart.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shoppos_core::money::Money;
//!
//! let price = Money::from_units(5000);
//! let line = price.checked_mul_quantity(3).unwrap();
//! assert_eq!(line.units(), 15000);
//! assert_eq!(line.to_string(), "15.000₫");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole currency units.
///
/// Signed so that refunds and corrections remain representable, though the
/// sale path only ever produces non-negative amounts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole currency units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    /// Returns the value in whole currency units.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Multiplies a unit price by a quantity, returning `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use shoppos_core::money::Money;
    ///
    /// assert_eq!(Money::from_units(2500).checked_mul_quantity(4), Some(Money::from_units(10000)));
    /// assert_eq!(Money::from_units(i64::MAX).checked_mul_quantity(2), None);
    /// ```
    #[inline]
    pub const fn checked_mul_quantity(self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display groups thousands with `.` and appends the đồng sign.
///
/// ## Note
/// This is for logs and receipts in tests. The presentation layer owns real
/// localisation.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}₫", sign, grouped)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl From<i64> for Money {
    fn from(units: i64) -> Self {
        Money(units)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_units() {
        let money = Money::from_units(15000);
        assert_eq!(money.units(), 15000);
        assert!(!money.is_zero());
        assert!(Money::zero().is_zero());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_units(0).to_string(), "0₫");
        assert_eq!(Money::from_units(999).to_string(), "999₫");
        assert_eq!(Money::from_units(10000).to_string(), "10.000₫");
        assert_eq!(Money::from_units(1234567).to_string(), "1.234.567₫");
        assert_eq!(Money::from_units(-5000).to_string(), "-5.000₫");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_units(10000);
        let b = Money::from_units(5000);

        assert_eq!((a + b).units(), 15000);
        assert_eq!((b * 3).units(), 15000);

        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total.units(), 20000);
    }

    #[test]
    fn test_checked_operations_detect_overflow() {
        assert_eq!(Money::from_units(i64::MAX).checked_add(Money::from_units(1)), None);
        assert_eq!(Money::from_units(i64::MAX / 2 + 1).checked_mul_quantity(2), None);
        assert_eq!(
            Money::from_units(20000).checked_add(Money::from_units(15000)),
            Some(Money::from_units(35000))
        );
    }
}

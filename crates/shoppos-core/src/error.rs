//! # Error Types
//!
//! Domain-specific error types for shoppos-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shoppos-core errors (this file)                                       │
//! │  ├── CoreError        - Cart / assembly rule violations                │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  shoppos-db errors                                                     │
//! │  └── DbError          - Local store failures (StorageUnavailable...)   │
//! │                                                                         │
//! │  shoppos-sync errors                                                   │
//! │  └── SyncError        - Remote, config and engine failures             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SyncError → presentation layer    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations raised before anything is
/// written locally. A checkout that hits one of these never reaches the queue.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product is not in the cart.
    #[error("Product not in cart: {0}")]
    ProductNotInCart(String),

    /// Checkout was attempted with nothing in the cart.
    #[error("Cannot assemble a sale from an empty cart")]
    EmptyCart,

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// The declared sale total does not equal the sum of its lines.
    ///
    /// ## When This Occurs
    /// ```text
    /// lines: 2 × 5000, 1 × 3000   → Σ = 13000
    /// declared total_amount: 12000
    ///      │
    ///      ▼
    /// TotalMismatch { declared: 12000, computed: 13000 }
    /// ```
    #[error("Sale total {declared} does not match sum of lines {computed}")]
    TotalMismatch { declared: i64, computed: i64 },

    /// Line arithmetic overflowed i64.
    #[error("Amount overflow while computing {context}")]
    AmountOverflow { context: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

//! # Database Error Types
//!
//! Error types for the local durable store.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← categorised: StorageUnavailable vs the rest   │
//! │       │                                                                 │
//! │       ├──► Sale capture: any error propagates (no silent drop)         │
//! │       └──► Cache reads: StorageUnavailable degrades to empty results   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// The local store cannot be opened or written at all.
    ///
    /// ## When This Occurs
    /// - Database file can't be created or opened (permissions, missing dir)
    /// - Disk full / quota exceeded
    /// - File is read-only, locked, or not a database
    /// - Pool closed or timed out acquiring a connection
    ///
    /// Fatal for writes, soft for cache reads.
    #[error("Local storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Two products with the same barcode
    /// - Re-enqueueing a sale with the same client_ref
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// A stored column could not be decoded (items JSON, timestamps).
    #[error("Corrupt {field} in stored row: {reason}")]
    Corrupt { field: String, reason: String },

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates a Corrupt error.
    pub fn corrupt(field: impl Into<String>, reason: impl ToString) -> Self {
        DbError::Corrupt {
            field: field.into(),
            reason: reason.to_string(),
        }
    }

    /// True when the store itself is unusable, as opposed to a single bad row.
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, DbError::StorageUnavailable(_))
    }
}

/// SQLite messages that mean the file itself is unusable.
const UNAVAILABLE_MESSAGES: &[&str] = &[
    "unable to open database file",
    "database or disk is full",
    "disk I/O error",
    "attempt to write a readonly database",
    "database is locked",
    "file is not a database",
    "database disk image is malformed",
];

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound            → DbError::NotFound
/// sqlx::Error::Database (UNIQUE ...)  → DbError::UniqueViolation
/// sqlx::Error::Database (disk/open)   → DbError::StorageUnavailable
/// Io / Pool* / Configuration          → DbError::StorageUnavailable
/// Other                               → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                if msg.contains("UNIQUE constraint failed") {
                    // "UNIQUE constraint failed: <table>.<column>"
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if UNAVAILABLE_MESSAGES.iter().any(|m| msg.contains(m)) {
                    DbError::StorageUnavailable(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::Io(e) => DbError::StorageUnavailable(e.to_string()),

            sqlx::Error::Configuration(e) => DbError::StorageUnavailable(e.to_string()),

            sqlx::Error::PoolTimedOut => {
                DbError::StorageUnavailable("timed out acquiring a connection".to_string())
            }

            sqlx::Error::PoolClosed => DbError::StorageUnavailable("pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

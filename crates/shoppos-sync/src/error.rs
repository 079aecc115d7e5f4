//! # Sync Error Types
//!
//! Error types for cache, queue and synchronization operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │     Remote      │  │     Local store         │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Unreachable    │  │  Database(DbError)      │ │
//! │  │  MissingShopId  │  │  Rejected       │  │   └ StorageUnavailable  │ │
//! │  │  InvalidUrl     │  │  InvalidResponse│  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │    Domain       │  │     Engine      │  │      Sale state         │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Core           │  │  Offline        │  │  SaleNotFound           │ │
//! │  │  Validation     │  │  AlreadyRunning │  │  NotSynced              │ │
//! │  │                 │  │  NoSession      │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use shoppos_core::{CoreError, ValidationError};
use shoppos_db::DbError;
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Error type for everything above the local store.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Shop id is required before any sale can be captured or pushed.
    #[error("Shop ID not configured. Run initial setup first.")]
    MissingShopId,

    /// Invalid remote URL.
    #[error("Invalid remote URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Remote Errors
    // =========================================================================
    /// Network failure, timeout or server-side (5xx) error.
    #[error("Remote store unreachable: {0}")]
    RemoteUnreachable(String),

    /// The remote store answered and refused the request.
    #[error("Remote store rejected request ({status}): {message}")]
    RemoteRejected { status: u16, message: String },

    /// The remote answered with a body we cannot use.
    #[error("Invalid remote response: {0}")]
    InvalidResponse(String),

    // =========================================================================
    // Local Store Errors
    // =========================================================================
    /// Local durable store failure.
    #[error(transparent)]
    Database(#[from] DbError),

    /// Failed to (de)serialize a record.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    // =========================================================================
    // Domain Errors
    // =========================================================================
    /// Cart or sale assembly rule broken.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Input validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // =========================================================================
    // Engine Errors
    // =========================================================================
    /// Operation needs connectivity and the device is offline.
    #[error("Device is offline")]
    Offline,

    /// Remote operation asked for while `[sync] enabled = false`.
    #[error("Sync is disabled in configuration")]
    SyncDisabled,

    /// `start()` called on a running engine.
    #[error("Sync engine is already running")]
    AlreadyRunning,

    /// No signed-in user to attribute sales to.
    #[error("No active session: sales cannot be attributed")]
    NoSession,

    /// No queued sale with this local id.
    #[error("Queued sale {local_id} not found")]
    SaleNotFound { local_id: i64 },

    /// The sale has not reached the remote store yet.
    #[error("Sale {code} is not synced yet")]
    NotSynced { local_id: i64, code: String },

    /// Internal engine error.
    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::SerializationFailed(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

/// ```text
/// connect / timeout / request I/O  → RemoteUnreachable
/// 5xx status                       → RemoteUnreachable
/// other status                     → RemoteRejected { status }
/// body decode                      → InvalidResponse
/// ```
impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return SyncError::InvalidResponse(err.to_string());
        }
        match err.status() {
            Some(status) if status.is_server_error() => {
                SyncError::RemoteUnreachable(err.to_string())
            }
            Some(status) => SyncError::RemoteRejected {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => SyncError::RemoteUnreachable(err.to_string()),
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl SyncError {
    /// Returns true if a later pass may succeed without anyone changing anything.
    ///
    /// ## Retryable Errors
    /// - Network failures and timeouts
    /// - 5xx, 408 and 429 responses
    /// - Device offline
    ///
    /// ## Non-Retryable Errors
    /// - Configuration errors
    /// - 4xx validation rejections
    /// - Local storage failures
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::RemoteUnreachable(_) | SyncError::Offline => true,
            SyncError::RemoteRejected { status, .. } => matches!(status, 408 | 429),
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::MissingShopId
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
                | SyncError::SyncDisabled
        )
    }

    /// Returns true if the local store cannot be used at all.
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, SyncError::Database(db) if db.is_storage_unavailable())
    }
}

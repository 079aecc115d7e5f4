//! # POS Configuration
//!
//! Configuration for the till: which shop it sells for, where the remote
//! store lives and how often queued sales are pushed.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     POS_SHOP_ID=shop-001                                               │
//! │     POS_REMOTE_URL=https://xyz.example.co                              │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/shoppos/pos.toml (Linux)                                 │
//! │     ~/Library/Application Support/com.shoppos.pos/pos.toml (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     push every 120 s, 50 rows per search/history page                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # pos.toml
//! [shop]
//! id = "b7e1c7a4-2f0e-4c55-9f0b-8d1f3e6a9c21"
//! name = "Tạp hoá Minh Anh"
//!
//! [session]
//! user_id = "2c9f..."
//!
//! [remote]
//! url = "https://xyz.example.co"
//! api_key = "public-anon-key"
//! timeout_secs = 15
//!
//! [sync]
//! enabled = true
//! push_interval_secs = 120
//! search_limit = 50
//! history_limit = 50
//!
//! [database]
//! path = "/var/lib/shoppos/shoppos.db"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{SyncError, SyncResult};

const CONFIG_FILE_NAME: &str = "pos.toml";
const DATABASE_FILE_NAME: &str = "shoppos.db";

// =============================================================================
// Shop / Session
// =============================================================================

/// The shop this till sells for.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopConfig {
    /// Remote shop identifier. Every cached product and queued sale carries it.
    #[serde(default)]
    pub id: String,

    /// Human-readable shop name.
    #[serde(default)]
    pub name: String,
}

/// Signed-in user, normally filled at runtime by the auth collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Author attributed to pushed sales (`created_by`).
    #[serde(default)]
    pub user_id: Option<String>,
}

// =============================================================================
// Remote Settings
// =============================================================================

/// Remote store endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Base URL of the REST endpoint (the `/rest/v1/` prefix is appended).
    #[serde(default)]
    pub url: String,

    /// Public API key sent on every request.
    #[serde(default)]
    pub api_key: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    15
}

impl Default for RemoteSettings {
    fn default() -> Self {
        RemoteSettings {
            url: String::new(),
            api_key: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

impl RemoteSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// =============================================================================
// Sync Settings
// =============================================================================

/// Sync behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// When false the till runs local-only and the remote section is ignored.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Period of the push timer (seconds).
    #[serde(default = "default_push_interval")]
    pub push_interval_secs: u64,

    /// Maximum rows returned by a catalog search.
    #[serde(default = "default_page_limit")]
    pub search_limit: u32,

    /// Maximum rows returned by the sales history.
    #[serde(default = "default_page_limit")]
    pub history_limit: u32,
}

fn default_true() -> bool {
    true
}

fn default_push_interval() -> u64 {
    120
}

fn default_page_limit() -> u32 {
    shoppos_core::DEFAULT_PAGE_LIMIT
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            enabled: default_true(),
            push_interval_secs: default_push_interval(),
            search_limit: default_page_limit(),
            history_limit: default_page_limit(),
        }
    }
}

impl SyncSettings {
    pub fn push_interval(&self) -> Duration {
        Duration::from_secs(self.push_interval_secs)
    }
}

// =============================================================================
// Database Settings
// =============================================================================

/// Local store location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file path. Empty means the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete till configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PosConfig {
    #[serde(default)]
    pub shop: ShopConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub remote: RemoteSettings,

    #[serde(default)]
    pub sync: SyncSettings,

    #[serde(default)]
    pub database: DatabaseSettings,
}

impl PosConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (pos.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading POS config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "POS config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.shop.id.trim().is_empty() {
            return Err(SyncError::MissingShopId);
        }

        if self.sync.push_interval_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "push_interval_secs must be at least 1".into(),
            ));
        }

        if self.sync.search_limit == 0 || self.sync.history_limit == 0 {
            return Err(SyncError::InvalidConfig(
                "search_limit and history_limit must be greater than 0".into(),
            ));
        }

        if self.sync.enabled {
            self.remote_url()?;
        }

        Ok(())
    }

    /// Parses the remote URL; only http(s) is accepted.
    pub fn remote_url(&self) -> SyncResult<Url> {
        let url = Url::parse(&self.remote.url)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(SyncError::InvalidUrl(format!(
                "Remote URL must start with http:// or https://, got scheme '{}'",
                other
            ))),
        }
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(id) = std::env::var("POS_SHOP_ID") {
            debug!(shop_id = %id, "Overriding shop ID from environment");
            self.shop.id = id;
        }

        if let Ok(user) = std::env::var("POS_USER_ID") {
            self.session.user_id = if user.is_empty() { None } else { Some(user) };
        }

        if let Ok(url) = std::env::var("POS_REMOTE_URL") {
            debug!(url = %url, "Overriding remote URL from environment");
            self.remote.url = url;
        }

        if let Ok(key) = std::env::var("POS_REMOTE_API_KEY") {
            self.remote.api_key = key;
        }

        if let Ok(secs) = std::env::var("POS_PUSH_INTERVAL_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.sync.push_interval_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring unparseable POS_PUSH_INTERVAL_SECS"),
            }
        }

        if let Ok(path) = std::env::var("POS_DATABASE_PATH") {
            self.database.path = Some(PathBuf::from(path));
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "shoppos", "pos")
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Resolves the SQLite file: explicit path, else the platform data dir.
    pub fn database_path(&self) -> SyncResult<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().join(DATABASE_FILE_NAME))
            .ok_or_else(|| SyncError::InvalidConfig("No data directory available".into()))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn shop_id(&self) -> &str {
        &self.shop.id
    }

    pub fn user_id(&self) -> Option<&str> {
        self.session.user_id.as_deref()
    }

    pub fn is_sync_enabled(&self) -> bool {
        self.sync.enabled
    }
}

//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (STACKPAGER_*)
//! 2. TOML config file (if STACKPAGER_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (STACKPAGER_*)
/// 2. TOML config file (if STACKPAGER_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Socket address the HTTP server binds to.
    ///
    /// Set via STACKPAGER_BIND_ADDR environment variable.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Path to the SQLite session database.
    ///
    /// Set via STACKPAGER_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Base URL of the Stack Exchange API.
    ///
    /// Set via STACKPAGER_API_BASE_URL environment variable.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Optional Stack Exchange app key. Raises the per-IP daily quota.
    ///
    /// Set via STACKPAGER_API_KEY environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// User-Agent string for upstream requests.
    ///
    /// Set via STACKPAGER_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Upstream request timeout in milliseconds.
    ///
    /// Set via STACKPAGER_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Query endpoint calls allowed per caller per minute.
    ///
    /// Set via STACKPAGER_THROTTLE_PER_MINUTE environment variable.
    #[serde(default = "default_throttle_per_minute")]
    pub throttle_per_minute: u32,

    /// Query endpoint calls allowed per caller per hour.
    ///
    /// Set via STACKPAGER_THROTTLE_PER_HOUR environment variable.
    #[serde(default = "default_throttle_per_hour")]
    pub throttle_per_hour: u32,

    /// Key the throttle on `X-Forwarded-For`/`X-Real-IP` instead of the
    /// socket peer. Only enable behind a reverse proxy that sets them.
    ///
    /// Set via STACKPAGER_TRUST_PROXY_HEADERS environment variable.
    #[serde(default)]
    pub trust_proxy_headers: bool,

    /// Idle lifetime of a caller session in seconds.
    ///
    /// Set via STACKPAGER_SESSION_TTL_SECS environment variable.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: i64,

    /// How often expired sessions are purged, in seconds.
    ///
    /// Set via STACKPAGER_PURGE_INTERVAL_SECS environment variable.
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,

    /// Optional JSON-lines file listing searchable sites.
    ///
    /// Set via STACKPAGER_SITE_CATALOG_PATH environment variable.
    #[serde(default)]
    pub site_catalog_path: Option<PathBuf>,

    /// Number of catalog entries offered to the page-render endpoint.
    ///
    /// Set via STACKPAGER_SITE_CATALOG_LIMIT environment variable.
    #[serde(default = "default_site_catalog_limit")]
    pub site_catalog_limit: usize,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./stackpager-sessions.sqlite")
}

fn default_api_base_url() -> String {
    "https://api.stackexchange.com/2.3".into()
}

fn default_user_agent() -> String {
    "stackpager/0.1".into()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_throttle_per_minute() -> u32 {
    30
}

fn default_throttle_per_hour() -> u32 {
    500
}

fn default_session_ttl_secs() -> i64 {
    1_209_600 // two weeks
}

fn default_purge_interval_secs() -> u64 {
    3600
}

fn default_site_catalog_limit() -> usize {
    4
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            db_path: default_db_path(),
            api_base_url: default_api_base_url(),
            api_key: None,
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            throttle_per_minute: default_throttle_per_minute(),
            throttle_per_hour: default_throttle_per_hour(),
            trust_proxy_headers: false,
            session_ttl_secs: default_session_ttl_secs(),
            purge_interval_secs: default_purge_interval_secs(),
            site_catalog_path: None,
            site_catalog_limit: default_site_catalog_limit(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Purge interval as Duration for use with tokio.
    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `STACKPAGER_`
    /// 2. TOML file from `STACKPAGER_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("STACKPAGER_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("STACKPAGER_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

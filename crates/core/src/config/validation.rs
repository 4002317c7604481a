//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Longest accepted session lifetime: one year.
pub const MAX_SESSION_TTL_SECS: i64 = 31_536_000;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` or `api_base_url` is empty
    /// - either throttle rate is 0, or the hourly rate is below the per-minute rate
    /// - `session_ttl_secs`, `purge_interval_secs` or `site_catalog_limit` is 0
    /// - `session_ttl_secs` exceeds one year
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.api_base_url.is_empty() {
            return Err(ConfigError::Invalid { field: "api_base_url".into(), reason: "must not be empty".into() });
        }

        if self.throttle_per_minute == 0 {
            return Err(ConfigError::Invalid {
                field: "throttle_per_minute".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.throttle_per_hour < self.throttle_per_minute {
            return Err(ConfigError::Invalid {
                field: "throttle_per_hour".into(),
                reason: "must be at least throttle_per_minute".into(),
            });
        }

        if self.session_ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                field: "session_ttl_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.session_ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(ConfigError::Invalid {
                field: "session_ttl_secs".into(),
                reason: format!("must not exceed one year ({MAX_SESSION_TTL_SECS}s)"),
            });
        }

        if self.purge_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "purge_interval_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.site_catalog_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "site_catalog_limit".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.api_key.is_none() {
            tracing::warn!("api_key not set; upstream quota is limited to the anonymous per-IP allowance");
        }

        Ok(())
    }
}

//! Unified error types for stackpager.
//!
//! Every variant carries a stable code prefix in its display string and maps
//! onto an HTTP status for the query endpoint.

use tokio_rusqlite::rusqlite;

/// Unified error types for the stackpager service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unparseable dates or missing required query parameters.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Upstream returned no items. Either the search is empty or the
    /// provider quota is spent; the payload does not say which.
    #[error("PROVIDER_EXHAUSTED: {0}")]
    ProviderExhausted(String),

    /// Transport, timeout or malformed payload from upstream.
    #[error("PROVIDER_ERROR: {0}")]
    ProviderError(String),

    /// Local per-caller quota exceeded.
    #[error("CALLER_THROTTLED: retry after {retry_after}s")]
    CallerThrottled { retry_after: u64 },

    /// Session database operation failed.
    #[error("SESSION_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("SESSION_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Session state could not be encoded.
    #[error("SESSION_ERROR: {0}")]
    Serialization(String),
}

impl Error {
    /// HTTP status code reported for this error on the query endpoint.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::InvalidInput(_) => 400,
            Error::ProviderExhausted(_) | Error::CallerThrottled { .. } => 429,
            Error::ProviderError(_) => 502,
            Error::Database(_) | Error::MigrationFailed(_) | Error::Serialization(_) => 500,
        }
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("start_date".to_string());
        assert!(err.to_string().contains("INVALID_INPUT"));
        assert!(err.to_string().contains("start_date"));
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(Error::InvalidInput("x".into()).http_status(), 400);
        assert_eq!(Error::ProviderExhausted("x".into()).http_status(), 429);
        assert_eq!(Error::CallerThrottled { retry_after: 3 }.http_status(), 429);
        assert_eq!(Error::ProviderError("x".into()).http_status(), 502);
        assert_eq!(Error::MigrationFailed("x".into()).http_status(), 500);
    }

    #[test]
    fn test_throttled_display_includes_wait() {
        let err = Error::CallerThrottled { retry_after: 42 };
        assert!(err.to_string().contains("42s"));
    }
}

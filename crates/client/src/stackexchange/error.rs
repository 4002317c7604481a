//! Stack Exchange client error types.

use std::sync::Arc;

/// Errors from the Stack Exchange API client.
///
/// An empty result set is not an error; see `FetchOutcome::Exhausted`.
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    /// Query parameters rejected before any request was sent.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response body is not a Stack Exchange wrapper object.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for StackError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { StackError::Timeout } else { StackError::Network(Arc::new(err)) }
    }
}

impl From<StackError> for stackpager_core::Error {
    fn from(err: StackError) -> Self {
        stackpager_core::Error::ProviderError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(StackError::Timeout.to_string(), "request timeout");

        let err = StackError::Parse("expected value".to_string());
        assert!(err.to_string().contains("parse error"));
    }

    #[test]
    fn test_into_provider_error() {
        let err: stackpager_core::Error = StackError::Timeout.into();
        assert!(matches!(err, stackpager_core::Error::ProviderError(msg) if msg == "request timeout"));
    }
}

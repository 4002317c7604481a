//! Stack Exchange response types and normalization.

use serde::Deserialize;
use stackpager_core::Row;

use crate::stackexchange::StackError;

/// Raw common wrapper returned by every Stack Exchange API method.
///
/// Error responses use the same wrapper with the `error_*` fields set and
/// no `items`.
#[derive(Debug, Deserialize)]
pub struct ApiWrapper {
    #[serde(default)]
    pub items: Vec<ApiQuestion>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub quota_remaining: Option<i64>,
    #[serde(default)]
    pub backoff: Option<u64>,
    #[serde(default)]
    pub error_id: Option<i64>,
    #[serde(default)]
    pub error_name: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// The question fields this service reads.
#[derive(Debug, Deserialize)]
pub struct ApiQuestion {
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub link: String,
}

/// Provider diagnostics attached to an empty response.
///
/// Informational only: an empty `items` list is reported as exhausted
/// whether or not these fields are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExhaustionInfo {
    pub quota_remaining: Option<i64>,
    pub backoff: Option<u64>,
    pub error_id: Option<i64>,
    pub error_name: Option<String>,
    pub error_message: Option<String>,
}

/// Result of fetching one upstream page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// At least one item came back.
    Page { rows: Vec<Row>, has_more: bool },
    /// No items: either nothing matched or the provider quota is spent.
    Exhausted(ExhaustionInfo),
}

impl From<ApiWrapper> for FetchOutcome {
    fn from(raw: ApiWrapper) -> Self {
        if raw.items.is_empty() {
            return FetchOutcome::Exhausted(ExhaustionInfo {
                quota_remaining: raw.quota_remaining,
                backoff: raw.backoff,
                error_id: raw.error_id,
                error_name: raw.error_name,
                error_message: raw.error_message,
            });
        }

        let rows = raw
            .items
            .into_iter()
            .map(|q| Row { title: q.title, tags: q.tags, link: q.link })
            .collect();

        FetchOutcome::Page { rows, has_more: raw.has_more }
    }
}

/// Decode a response body into an outcome, independent of HTTP status.
pub fn classify(body: &[u8]) -> Result<(FetchOutcome, Option<u64>), StackError> {
    let raw: ApiWrapper = serde_json::from_slice(body).map_err(|e| StackError::Parse(e.to_string()))?;
    let backoff = raw.backoff;
    Ok((FetchOutcome::from(raw), backoff))
}

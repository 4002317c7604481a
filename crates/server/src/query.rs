//! Query orchestration.
//!
//! Serves a page from the caller's session when the exact (query, page) pair
//! is cached, otherwise fetches it upstream and records it. Failed fetches
//! never touch the session.

use serde::{Deserialize, Serialize};
use stackpager_client::{FetchOutcome, QuestionSource};
use stackpager_core::{Error, FilterKey, Row, SessionContext};

/// Row-count estimate reported while more pages exist. The provider exposes
/// no totals; paging UIs only test this against zero.
pub const RECORDS_ESTIMATE: u64 = 1000;

/// Message body returned when upstream yields no items.
pub const EXHAUSTED_MESSAGE: &str = "Stackoverflow api limit exceed";

/// Response envelope for the paging UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEnvelope {
    /// `[title, tags_csv, link]` per row.
    pub data: Vec<[String; 3]>,
    #[serde(rename = "recordsTotal")]
    pub records_total: u64,
    #[serde(rename = "recordsFiltered")]
    pub records_filtered: u64,
}

impl PageEnvelope {
    pub fn new(rows: &[Row], has_more: bool) -> Self {
        let estimate = if has_more { RECORDS_ESTIMATE } else { 0 };
        Self { data: rows.iter().map(Row::to_columns).collect(), records_total: estimate, records_filtered: estimate }
    }
}

/// Answer one query for one caller.
///
/// # Errors
///
/// - `Error::ProviderExhausted` when upstream returns no items
/// - `Error::ProviderError` on transport, timeout or payload failures
pub async fn run_query<S>(ctx: &mut SessionContext, source: &S, key: &FilterKey) -> Result<PageEnvelope, Error>
where
    S: QuestionSource + ?Sized,
{
    let identity = key.identity();

    if let Some(page) = ctx.lookup(identity, key.page_number) {
        tracing::debug!(page = key.page_number, site = %identity.site_name, "page served from session");
        return Ok(PageEnvelope::new(&page.rows, page.has_more));
    }

    tracing::debug!(page = key.page_number, site = %identity.site_name, "page not cached, fetching upstream");

    let outcome = source.fetch_page(identity, key.page_number).await.map_err(|e| {
        tracing::error!(error = %e, "upstream fetch failed");
        Error::from(e)
    })?;

    match outcome {
        FetchOutcome::Page { rows, has_more } => {
            let envelope = PageEnvelope::new(&rows, has_more);
            ctx.record(identity.clone(), key.page_number, rows, has_more);
            Ok(envelope)
        }
        FetchOutcome::Exhausted(_) => Err(Error::ProviderExhausted(EXHAUSTED_MESSAGE.to_string())),
    }
}

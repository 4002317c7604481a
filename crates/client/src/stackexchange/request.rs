//! Stack Exchange request parameters.

use serde::Serialize;
use stackpager_core::QueryIdentity;

use crate::stackexchange::StackError;

/// Largest page size the API accepts.
const MAX_PAGE_SIZE: u32 = 100;

/// Query-string parameters shared by `/questions` and `/search/advanced`.
///
/// See https://api.stackexchange.com/docs/questions and
/// https://api.stackexchange.com/docs/advanced-search.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct QuestionQuery {
    pub site: String,
    pub order: &'static str,
    pub sort: &'static str,
    pub fromdate: i64,
    pub todate: i64,
    pub page: u32,
    pub pagesize: u32,

    /// Title search; only sent to the advanced search endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// App key for a larger request quota.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl QuestionQuery {
    /// Build the query for one page of a search, newest activity first.
    pub fn new(identity: &QueryIdentity, page: u32, pagesize: u32) -> Self {
        let title = (!identity.search_text.is_empty()).then(|| identity.search_text.clone());

        Self {
            site: identity.site_name.clone(),
            order: "desc",
            sort: "activity",
            fromdate: identity.start_date,
            todate: identity.end_date,
            page,
            pagesize,
            title,
            key: None,
        }
    }

    pub fn with_key(mut self, key: Option<String>) -> Self {
        self.key = key;
        self
    }

    /// API path for this query: advanced search when there is search text.
    pub fn endpoint(&self) -> &'static str {
        if self.title.is_some() { "/search/advanced" } else { "/questions" }
    }

    /// Validate parameters the API would reject outright.
    pub fn validate(&self) -> Result<(), StackError> {
        if self.page == 0 {
            return Err(StackError::InvalidQuery("page must be at least 1".to_string()));
        }

        if !(1..=MAX_PAGE_SIZE).contains(&self.pagesize) {
            return Err(StackError::InvalidQuery(format!(
                "pagesize must be 1-{MAX_PAGE_SIZE}, got {}",
                self.pagesize
            )));
        }

        Ok(())
    }
}

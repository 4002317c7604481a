//! Filter keys: the canonical identity of a paginated query.
//!
//! A [`QueryIdentity`] names one logical search (date range, site and search
//! text). A [`FilterKey`] adds the 1-based page number within that search.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Rows shown per page by the paging UI. Independent of the upstream page size.
pub const DISPLAY_PAGE_LENGTH: u32 = 10;

/// Inbound date format: month/day/year.
const DATE_FORMAT: &str = "%m/%d/%Y";

/// The (start, end, site, text) quadruple a page store is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryIdentity {
    /// Start of the date range, epoch seconds.
    pub start_date: i64,
    /// End of the date range, epoch seconds.
    pub end_date: i64,
    pub site_name: String,
    /// Free-text search; empty means "list questions".
    pub search_text: String,
}

/// A query identity plus the page requested under it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterKey {
    pub identity: QueryIdentity,
    /// 1-based page number.
    pub page_number: u32,
}

impl FilterKey {
    pub fn identity(&self) -> &QueryIdentity {
        &self.identity
    }
}

/// Raw query-string parameters of the query endpoint.
///
/// Field names follow the paging UI's wire names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterParams {
    #[serde(rename = "iDisplayStart", default)]
    pub display_start: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub site_name: Option<String>,
}

impl FilterParams {
    /// Normalize raw parameters into a [`FilterKey`].
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if a required parameter is missing, the
    /// display offset is not a non-negative integer, or a date is not
    /// `MM/DD/YYYY`.
    pub fn normalize(&self) -> Result<FilterKey, Error> {
        let offset = require(&self.display_start, "iDisplayStart")?;
        let offset: u32 = offset
            .trim()
            .parse()
            .map_err(|_| Error::InvalidInput(format!("iDisplayStart must be a non-negative integer, got {offset:?}")))?;

        let start_date = parse_date(require(&self.start_date, "start_date")?)?;
        let end_date = parse_date(require(&self.end_date, "end_date")?)?;
        let site_name = require(&self.site_name, "site_name")?.to_string();

        Ok(FilterKey {
            identity: QueryIdentity {
                start_date,
                end_date,
                site_name,
                search_text: self.title.clone().unwrap_or_default(),
            },
            page_number: page_number_for_offset(offset),
        })
    }
}

fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, Error> {
    value
        .as_deref()
        .ok_or_else(|| Error::InvalidInput(format!("missing required parameter: {name}")))
}

/// Parse a `MM/DD/YYYY` date into epoch seconds at UTC midnight.
pub fn parse_date(raw: &str) -> Result<i64, Error> {
    let date = NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| Error::InvalidInput(format!("invalid date {raw:?} (expected MM/DD/YYYY): {e}")))?;

    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .ok_or_else(|| Error::InvalidInput(format!("invalid date {raw:?}")))
}

/// Map a zero-based row offset onto a 1-based page number.
pub fn page_number_for_offset(offset: u32) -> u32 {
    offset / DISPLAY_PAGE_LENGTH + 1
}

//! Caller sessions: the owned cache context and its SQLite persistence.
//!
//! Each caller is identified by an opaque session id. The handler loads a
//! [`SessionContext`] for that id, passes it by `&mut` to the query
//! orchestrator, and writes it back only if it was modified.

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod records;

pub use connection::SessionDb;

use crate::filter::QueryIdentity;
use crate::pages::{CachedPage, PageStore, Row};

/// Per-caller cache context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    session_id: String,
    pages: PageStore,
    modified: bool,
}

impl SessionContext {
    /// A fresh context with an empty page store.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self::with_pages(session_id, PageStore::Empty)
    }

    pub fn with_pages(session_id: impl Into<String>, pages: PageStore) -> Self {
        Self { session_id: session_id.into(), pages, modified: false }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn pages(&self) -> &PageStore {
        &self.pages
    }

    /// Whether the context must be written back.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn lookup(&self, identity: &QueryIdentity, page_number: u32) -> Option<&CachedPage> {
        self.pages.lookup(identity, page_number)
    }

    /// Record a page and mark the context modified.
    pub fn record(&mut self, identity: QueryIdentity, page_number: u32, rows: Vec<Row>, has_more: bool) {
        self.pages.record(identity, page_number, rows, has_more);
        self.modified = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> QueryIdentity {
        QueryIdentity { start_date: 0, end_date: 86_400, site_name: "serverfault".into(), search_text: String::new() }
    }

    #[test]
    fn test_lookup_does_not_mark_modified() {
        let ctx = SessionContext::new("abc");
        assert!(ctx.lookup(&identity(), 1).is_none());
        assert!(!ctx.is_modified());
    }

    #[test]
    fn test_record_marks_modified() {
        let mut ctx = SessionContext::new("abc");
        ctx.record(identity(), 1, Vec::new(), false);
        assert!(ctx.is_modified());
        assert_eq!(ctx.pages().len(), 1);
        assert_eq!(ctx.session_id(), "abc");
    }
}

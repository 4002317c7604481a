//! Per-caller page store.
//!
//! A store is either empty or bound to exactly one [`QueryIdentity`]. Pages
//! cached under an identity live until a fetch succeeds for a different
//! identity, at which point the whole store is replaced.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::filter::QueryIdentity;

/// Separator used when tags are flattened into a single column.
pub const TAG_SEPARATOR: &str = ",";

/// A normalized search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub title: String,
    pub tags: Vec<String>,
    pub link: String,
}

impl Row {
    /// The `[title, tags_csv, link]` triple sent to the paging UI.
    pub fn to_columns(&self) -> [String; 3] {
        [self.title.clone(), self.tags.join(TAG_SEPARATOR), self.link.clone()]
    }
}

/// Rows and pagination flag for one page of one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPage {
    pub rows: Vec<Row>,
    /// Upstream reported further pages beyond this one.
    pub has_more: bool,
}

/// Cached pages for a single caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStore {
    #[default]
    Empty,
    Bound {
        identity: QueryIdentity,
        pages: BTreeMap<u32, CachedPage>,
    },
}

impl PageStore {
    /// Return the cached page for `(identity, page_number)`.
    ///
    /// Only an exact identity match can hit.
    pub fn lookup(&self, identity: &QueryIdentity, page_number: u32) -> Option<&CachedPage> {
        match self {
            PageStore::Bound { identity: bound, pages } if bound == identity => pages.get(&page_number),
            _ => None,
        }
    }

    /// Store a freshly fetched page.
    ///
    /// If the store is bound to a different identity (or empty) it is
    /// replaced by a new store bound to `identity` before inserting.
    pub fn record(&mut self, identity: QueryIdentity, page_number: u32, rows: Vec<Row>, has_more: bool) {
        let page = CachedPage { rows, has_more };

        if let PageStore::Bound { identity: bound, pages } = self
            && *bound == identity
        {
            pages.insert(page_number, page);
            return;
        }

        *self = PageStore::Bound { identity, pages: BTreeMap::from([(page_number, page)]) };
    }

    /// The identity this store is bound to, if any.
    pub fn identity(&self) -> Option<&QueryIdentity> {
        match self {
            PageStore::Empty => None,
            PageStore::Bound { identity, .. } => Some(identity),
        }
    }

    /// Number of cached pages.
    pub fn len(&self) -> usize {
        match self {
            PageStore::Empty => 0,
            PageStore::Bound { pages, .. } => pages.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Catalog of searchable Stack Exchange sites.
//!
//! The catalog is read-only and only feeds the page-render endpoint; query
//! handling never validates `site_name` against it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A selectable site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: u32,
    /// API site parameter, e.g. `stackoverflow`.
    pub name: String,
}

/// Ordered list of sites offered to the paging UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteCatalog {
    sites: Vec<Site>,
}

impl SiteCatalog {
    pub fn builtin() -> Self {
        let sites = ["stackoverflow", "serverfault", "superuser", "askubuntu"]
            .into_iter()
            .zip(1..)
            .map(|(name, id)| Site { id, name: name.to_string() })
            .collect();
        Self { sites }
    }

    /// Parse one JSON object per line, keeping the first `limit` entries.
    pub fn from_json_lines(input: &str, limit: usize) -> Result<Self, Error> {
        let sites = input
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(limit)
            .enumerate()
            .map(|(idx, line)| {
                serde_json::from_str::<Site>(line)
                    .map_err(|e| Error::InvalidInput(format!("site catalog line {}: {e}", idx + 1)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { sites })
    }

    /// Read a JSON-lines catalog file.
    pub fn load(path: impl AsRef<Path>, limit: usize) -> Result<Self, Error> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidInput(format!("cannot read site catalog {}: {e}", path.display())))?;
        Self::from_json_lines(&input, limit)
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }
}

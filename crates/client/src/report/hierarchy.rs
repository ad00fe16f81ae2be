//! Existing vs. proposed page hierarchy.

use serde::Serialize;
use url::Url;

use linker_core::sites::{FALLBACK_ROOT, root_for_url};

/// Path segments of the page today and after migration, under one site root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HierarchyComparison {
    pub root: String,
    pub existing: Vec<String>,
    pub proposed: Vec<String>,
}

/// Split a path on `/`, dropping empty segments.
pub fn path_segments(path: &str) -> Vec<String> {
    path.split('/').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

/// Path segments of a URL; scheme-less input is read as `host/path`.
fn url_segments(url: &str) -> Vec<String> {
    let url = url.trim();
    let parsed = if url.contains("://") { Url::parse(url) } else { Url::parse(&format!("http://{url}")) };
    match parsed {
        Ok(parsed) => path_segments(parsed.path()),
        Err(_) => path_segments(url),
    }
}

impl HierarchyComparison {
    /// Compare the existing URL's path against the proposed path.
    ///
    /// The root comes from the existing URL's host.
    pub fn new(existing_url: &str, proposed_path: &str) -> Self {
        let root = if existing_url.trim().is_empty() { FALLBACK_ROOT.to_string() } else { root_for_url(existing_url) };
        Self { root, existing: url_segments(existing_url), proposed: path_segments(proposed_path) }
    }

    /// Rows for a side-by-side view; the shorter side is padded with None.
    pub fn side_by_side(&self) -> Vec<(Option<&str>, Option<&str>)> {
        let depth = self.existing.len().max(self.proposed.len());
        (0..depth)
            .map(|i| (self.existing.get(i).map(String::as_str), self.proposed.get(i).map(String::as_str)))
            .collect()
    }

    /// The proposed location as `Root / a / b`.
    pub fn proposed_trail(&self) -> String {
        std::iter::once(self.root.as_str())
            .chain(self.proposed.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

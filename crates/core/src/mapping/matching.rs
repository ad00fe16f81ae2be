//! URL comparison keys for matching page links against DSM rows.

use url::Url;

/// The parts of a URL that take part in mapping comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchKey {
    /// Lowercased host without a leading `www.`. None for bare paths.
    pub host: Option<String>,
    /// Lowercased path without a trailing slash; the site root is `/`.
    pub path: String,
    pub query: Option<String>,
}

impl MatchKey {
    /// Parse a link href or spreadsheet cell.
    ///
    /// Accepts absolute http(s) URLs, scheme-less hosts (`site.edu/page`) and
    /// bare paths (`/page`). Returns None for anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let (url, has_host) = if raw.starts_with('/') {
            (Url::parse("http://localhost").ok()?.join(raw).ok()?, false)
        } else if raw.contains("://") {
            (Url::parse(raw).ok()?, true)
        } else {
            (Url::parse(&format!("http://{raw}")).ok()?, true)
        };

        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }

        let host = if has_host {
            url.host_str().map(|h| h.to_ascii_lowercase().trim_start_matches("www.").to_string())
        } else {
            None
        };

        let trimmed = url.path().trim_end_matches('/').to_lowercase();
        let path = if trimmed.is_empty() { "/".to_string() } else { trimmed };
        let query = url.query().filter(|q| !q.is_empty()).map(str::to_string);

        Some(Self { host, path, query })
    }

    /// Whether `self` (a link) points at the page described by `entry`,
    /// ignoring scheme and host.
    ///
    /// The query only matters when the entry carries one.
    pub fn same_page(&self, entry: &MatchKey) -> bool {
        self.path == entry.path && (entry.query.is_none() || entry.query == self.query)
    }

    /// Like [`same_page`](Self::same_page) but also requires equal hosts
    /// when both sides have one.
    pub fn same_location(&self, entry: &MatchKey) -> bool {
        let hosts_agree = match (&self.host, &entry.host) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        };
        hosts_agree && self.same_page(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes() {
        let key = MatchKey::parse("HTTPS://www.Education.MUSC.edu/Students/").unwrap();
        assert_eq!(key.host.as_deref(), Some("education.musc.edu"));
        assert_eq!(key.path, "/students");
        assert_eq!(key.query, None);
    }

    #[test]
    fn test_parse_scheme_less_and_bare_path() {
        let key = MatchKey::parse("education.musc.edu/about").unwrap();
        assert_eq!(key.host.as_deref(), Some("education.musc.edu"));
        assert_eq!(key.path, "/about");

        let bare = MatchKey::parse("/about/").unwrap();
        assert_eq!(bare.host, None);
        assert_eq!(bare.path, "/about");
    }

    #[test]
    fn test_parse_rejects_non_http() {
        assert!(MatchKey::parse("mailto:someone@example.com").is_none());
        assert!(MatchKey::parse("").is_none());
        assert!(MatchKey::parse("   ").is_none());
    }

    #[test]
    fn test_root_path() {
        let a = MatchKey::parse("https://example.edu").unwrap();
        let b = MatchKey::parse("http://example.edu/").unwrap();
        assert_eq!(a.path, "/");
        assert!(a.same_location(&b));
    }

    #[test]
    fn test_same_page_ignores_host_and_scheme() {
        let link = MatchKey::parse("http://other.host/Students").unwrap();
        let entry = MatchKey::parse("https://education.musc.edu/students/").unwrap();
        assert!(link.same_page(&entry));
        assert!(!link.same_location(&entry));
    }

    #[test]
    fn test_query_only_checked_when_entry_has_one() {
        let link = MatchKey::parse("https://a.edu/search?q=1").unwrap();
        let plain = MatchKey::parse("https://a.edu/search").unwrap();
        let other = MatchKey::parse("https://a.edu/search?q=2").unwrap();
        assert!(link.same_page(&plain));
        assert!(!link.same_page(&other));
    }

    #[test]
    fn test_fragment_ignored() {
        let link = MatchKey::parse("https://a.edu/page#section").unwrap();
        let entry = MatchKey::parse("https://a.edu/page").unwrap();
        assert!(link.same_location(&entry));
    }
}

//! Page snapshot data model.
//!
//! A [`PageSnapshot`] is the result of analyzing one URL at one point in time.
//! It is built fresh on every analysis, never mutated afterwards, and may be
//! persisted verbatim to the snapshot cache.

use serde::{Deserialize, Serialize};

/// Status sentinel meaning "not checkable / check failed".
pub const UNCHECKED_STATUS: &str = "0";

/// Placeholder title for embeds with neither a title attribute nor text.
pub const DEFAULT_EMBED_TITLE: &str = "Vimeo Video";

/// An outbound reference found in a content region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Visible anchor text, trimmed; empty when the anchor has none.
    pub text: String,
    /// Absolute href, resolved against the page's final URL.
    pub href: String,
    /// Stringified HTTP status, or [`UNCHECKED_STATUS`].
    pub status: String,
}

impl LinkRecord {
    pub fn new(text: impl Into<String>, href: impl Into<String>, status: impl Into<String>) -> Self {
        Self { text: text.into(), href: href.into(), status: status.into() }
    }

    /// Whether the status check could not produce a real HTTP code.
    pub fn is_unchecked(&self) -> bool {
        self.status == UNCHECKED_STATUS
    }

    /// Numeric status, or `None` for the sentinel or unparsable values.
    pub fn status_code(&self) -> Option<u16> {
        self.status.parse::<u16>().ok().filter(|code| *code != 0)
    }

    /// `tel:` and `mailto:` links need no page mapping during migration.
    pub fn is_contact(&self) -> bool {
        let href = self.href.to_ascii_lowercase();
        href.starts_with("tel:") || href.starts_with("mailto:")
    }
}

/// Embed provider. Only one provider is recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedKind {
    Vimeo,
}

impl EmbedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbedKind::Vimeo => "vimeo",
        }
    }
}

/// A retained embedded frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedRecord {
    pub kind: EmbedKind,
    pub title: String,
    pub src: String,
}

/// Links, PDFs and embeds pulled from the optional sidebar region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidebarContent {
    pub selector: String,
    pub links: Vec<LinkRecord>,
    pub pdfs: Vec<LinkRecord>,
    pub embeds: Vec<EmbedRecord>,
}

/// Result of analyzing one URL.
///
/// When `error` is set the snapshot is failed, not partial: every collection
/// is empty and the optional page metadata is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// Normalized absolute URL that was requested.
    pub source_url: String,
    /// URL after redirects; absent on failure.
    #[serde(default)]
    pub final_url: Option<String>,
    /// Selector used to scope extraction.
    pub selector: String,
    /// False when the selector matched nothing and the whole document was used.
    #[serde(default)]
    pub selector_matched: bool,
    pub links: Vec<LinkRecord>,
    pub pdfs: Vec<LinkRecord>,
    pub embeds: Vec<EmbedRecord>,
    #[serde(default)]
    pub sidebar: Option<SidebarContent>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub meta_robots: Option<String>,
    /// RFC 3339 timestamp of the analysis.
    pub fetched_at: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl PageSnapshot {
    /// Build a failed snapshot with empty collections.
    pub fn failed(source_url: impl Into<String>, selector: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            final_url: None,
            selector: selector.into(),
            selector_matched: false,
            links: Vec::new(),
            pdfs: Vec::new(),
            embeds: Vec::new(),
            sidebar: None,
            meta_description: None,
            meta_robots: None,
            fetched_at: now_rfc3339(),
            error: Some(error.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Fraction of `links` that are not `tel:`/`mailto:` links, in `0.0..=1.0`.
    pub fn difficulty(&self) -> f64 {
        if self.links.is_empty() {
            return 0.0;
        }
        let hard = self.links.iter().filter(|link| !link.is_contact()).count();
        hard as f64 / self.links.len() as f64
    }

    /// Counts of links, PDFs and embeds in the main region.
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.links.len(), self.pdfs.len(), self.embeds.len())
    }
}

pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

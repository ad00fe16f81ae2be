//! Anchor harvesting and PDF classification.

use scraper::{ElementRef, Selector};
use url::Url;

/// An anchor found in a content region, before its status is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// Visible text with whitespace collapsed; empty when the anchor has none.
    pub text: String,
    /// Href resolved against the page's final URL.
    pub href: Url,
}

impl Anchor {
    pub fn is_pdf(&self) -> bool {
        is_pdf(&self.href)
    }
}

/// Whether the URL's path ends in `.pdf`, ignoring case.
pub fn is_pdf(url: &Url) -> bool {
    url.path().to_ascii_lowercase().ends_with(".pdf")
}

/// Concatenated text of an element with runs of whitespace collapsed.
pub(crate) fn visible_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collect every `<a href>` inside `region`, in document order.
///
/// Hrefs that cannot be resolved against `base_url` are skipped. Duplicates
/// are kept: each anchor on the page is reported.
pub fn collect_anchors(region: ElementRef<'_>, base_url: &Url) -> Vec<Anchor> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut anchors = Vec::new();

    for element in region.select(&selector) {
        let Some(raw) = element.value().attr("href") else {
            continue;
        };

        let href = match base_url.join(raw.trim()) {
            Ok(u) => u,
            Err(e) => {
                tracing::debug!(href = raw, error = %e, "skipping unresolvable href");
                continue;
            }
        };

        anchors.push(Anchor { text: visible_text(&element), href });
    }

    anchors
}

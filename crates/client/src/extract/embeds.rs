//! Video embed detection.

use scraper::{ElementRef, Selector};
use url::Url;

use super::links::visible_text;
use linker_core::snapshot::DEFAULT_EMBED_TITLE;
use linker_core::{EmbedKind, EmbedRecord};

const VIMEO_PATTERN: &str = "vimeo";

/// Whether an iframe source points at Vimeo.
///
/// Checks the resolved host, or the raw source when it does not parse.
fn is_vimeo(raw: &str, resolved: Option<&Url>) -> bool {
    let haystack = match resolved.and_then(Url::host_str) {
        Some(host) => host.to_ascii_lowercase(),
        None => raw.to_ascii_lowercase(),
    };
    haystack.contains(VIMEO_PATTERN)
}

/// Collect Vimeo iframes inside `region`, in document order.
///
/// Every other iframe is dropped.
pub fn collect_embeds(region: ElementRef<'_>, base_url: &Url) -> Vec<EmbedRecord> {
    let Ok(selector) = Selector::parse("iframe[src]") else {
        return Vec::new();
    };

    region
        .select(&selector)
        .filter_map(|frame| {
            let raw = frame.value().attr("src")?.trim();
            let resolved = base_url.join(raw).ok();
            if !is_vimeo(raw, resolved.as_ref()) {
                tracing::debug!(src = raw, "ignoring non-vimeo iframe");
                return None;
            }

            let title = frame
                .value()
                .attr("title")
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .or_else(|| Some(visible_text(&frame)).filter(|t| !t.is_empty()))
                .unwrap_or_else(|| DEFAULT_EMBED_TITLE.to_string());

            let src = resolved.map(|u| u.to_string()).unwrap_or_else(|| raw.to_string());
            Some(EmbedRecord { kind: EmbedKind::Vimeo, title, src })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn embeds_in(html: &str) -> Vec<EmbedRecord> {
        let document = Html::parse_document(html);
        let base = Url::parse("https://example.com/page").unwrap();
        collect_embeds(document.root_element(), &base)
    }

    #[test]
    fn test_vimeo_kept_others_dropped() {
        let html = r#"
            <iframe src="https://player.vimeo.com/video/1" title="Campus Tour"></iframe>
            <iframe src="https://www.youtube.com/embed/abc" title="vimeo in the title"></iframe>
            <iframe src="https://maps.example.com/embed"></iframe>
        "#;
        let embeds = embeds_in(html);

        assert_eq!(embeds.len(), 1);
        assert_eq!(embeds[0].kind, EmbedKind::Vimeo);
        assert_eq!(embeds[0].title, "Campus Tour");
        assert_eq!(embeds[0].src, "https://player.vimeo.com/video/1");
    }

    #[test]
    fn test_host_match_is_case_insensitive() {
        let embeds = embeds_in(r#"<iframe src="//PLAYER.VIMEO.COM/video/2"></iframe>"#);
        assert_eq!(embeds.len(), 1);
        assert_eq!(embeds[0].src, "https://player.vimeo.com/video/2");
    }

    #[test]
    fn test_title_falls_back_to_placeholder() {
        let embeds = embeds_in(r#"<iframe src="https://player.vimeo.com/video/3" title="  "></iframe>"#);
        assert_eq!(embeds[0].title, DEFAULT_EMBED_TITLE);
    }

    #[test]
    fn test_path_mentioning_vimeo_is_not_enough() {
        let embeds = embeds_in(r#"<iframe src="https://example.com/vimeo/4"></iframe>"#);
        assert!(embeds.is_empty());
    }
}

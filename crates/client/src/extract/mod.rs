//! Page analysis: fetch, scope, harvest and classify.
//!
//! ### Content Region
//! - The first element matching the selector is the content region.
//! - When nothing matches, the whole document is used and a warning is logged.
//! - An optional sidebar region is extracted separately and never falls back.
//!
//! ### Classification
//! - Anchors whose resolved path ends in `.pdf` (any case) go to `pdfs`, the rest to `links`.
//! - Only Vimeo iframes are kept as embeds.
//! - Every anchor gets a status from the [`StatusCheck`], in document order.
//!
//! ### Failure
//! - Fetch failures and non-2xx responses fail the whole snapshot.
//! - [`ContentExtractor::analyze`] never returns an error; failures are
//!   recorded in [`PageSnapshot::error`] with empty collections.

pub mod embeds;
pub mod links;
pub mod meta;
pub mod region;

pub use embeds::collect_embeds;
pub use links::{Anchor, collect_anchors, is_pdf};
pub use meta::meta_content;
pub use region::{RegionMatch, find_region, parse_selector, select_region};

use std::sync::Arc;

use scraper::{ElementRef, Html};
use url::Url;

use crate::fetch::{FetchClient, FetchConfig, HttpStatusResolver, StatusCheck, normalize_url, resolve_statuses};
use linker_core::snapshot::now_rfc3339;
use linker_core::{AppConfig, EmbedRecord, Error, LinkRecord, PageSnapshot, SidebarContent};

/// Configuration for content extraction.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Sidebar selector; None skips sidebar extraction.
    pub sidebar_selector: Option<String>,

    /// Status checks in flight at once (default: 1)
    pub status_concurrency: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self { sidebar_selector: None, status_concurrency: 1 }
    }
}

impl ExtractConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            sidebar_selector: config.include_sidebar.then(|| config.sidebar_selector.clone()),
            status_concurrency: config.status_concurrency,
        }
    }
}

/// Anchors and embeds of one region, before status resolution.
#[derive(Debug, Clone, Default)]
pub struct ParsedRegion {
    pub anchors: Vec<Anchor>,
    pub embeds: Vec<EmbedRecord>,
}

impl ParsedRegion {
    fn from_element(element: ElementRef<'_>, base_url: &Url) -> Self {
        Self { anchors: collect_anchors(element, base_url), embeds: collect_embeds(element, base_url) }
    }
}

/// Everything pulled out of a document, owned so it can cross await points.
#[derive(Debug, Clone)]
pub struct ParsedPage {
    pub main: ParsedRegion,
    pub selector_matched: bool,
    pub sidebar: Option<(String, ParsedRegion)>,
    pub meta_description: Option<String>,
    pub meta_robots: Option<String>,
}

/// Parse an HTML document and harvest its regions.
pub fn parse_page(
    html: &str,
    base_url: &Url,
    selector: &str,
    sidebar_selector: Option<&str>,
) -> Result<ParsedPage, Error> {
    let document = Html::parse_document(html);

    let (element, matched) = select_region(&document, selector)?;
    if matched == RegionMatch::WholeDocument {
        tracing::warn!(selector, url = %base_url, "selector matched nothing, using whole document");
    }
    let main = ParsedRegion::from_element(element, base_url);

    let sidebar = sidebar_selector.map(|sidebar_selector| {
        let region = match find_region(&document, sidebar_selector) {
            Ok(Some(element)) => ParsedRegion::from_element(element, base_url),
            Ok(None) => {
                tracing::debug!(selector = sidebar_selector, "no sidebar region on page");
                ParsedRegion::default()
            }
            Err(e) => {
                tracing::warn!(selector = sidebar_selector, error = %e, "sidebar extraction skipped");
                ParsedRegion::default()
            }
        };
        (sidebar_selector.to_string(), region)
    });

    Ok(ParsedPage {
        main,
        selector_matched: matched == RegionMatch::Selected,
        sidebar,
        meta_description: meta_content(&document, "description"),
        meta_robots: meta_content(&document, "robots"),
    })
}

/// Fetches pages and turns them into [`PageSnapshot`]s.
pub struct ContentExtractor {
    fetch: FetchClient,
    checker: Arc<dyn StatusCheck>,
    config: ExtractConfig,
}

impl ContentExtractor {
    /// Create a new extractor from its parts.
    pub fn new(fetch: FetchClient, checker: Arc<dyn StatusCheck>, config: ExtractConfig) -> Self {
        Self { fetch, checker, config }
    }

    /// Create an extractor with HTTP page fetching and HEAD status checks.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let fetch = FetchClient::new(FetchConfig::for_pages(config))?;
        let checker = HttpStatusResolver::new(&FetchConfig::for_status(config))?;
        Ok(Self::new(fetch, Arc::new(checker), ExtractConfig::from_app(config)))
    }

    /// Analyze one page.
    ///
    /// The URL is normalized first. Failures never escape: they produce a
    /// failed snapshot.
    pub async fn analyze(&self, url: &str, selector: &str) -> PageSnapshot {
        let source_url = normalize_url(url);
        match self.try_analyze(&source_url, selector).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(url = %source_url, error = %e, "page analysis failed");
                PageSnapshot::failed(source_url, selector, e.to_string())
            }
        }
    }

    async fn try_analyze(&self, source_url: &str, selector: &str) -> Result<PageSnapshot, Error> {
        parse_selector(selector)?;

        let response = self.fetch.fetch(source_url).await?;
        if let Some(content_type) = response.content_type.as_deref()
            && !content_type.contains("html")
        {
            tracing::warn!(url = %response.final_url, content_type, "page is not HTML, extracting anyway");
        }
        let page = parse_page(
            &response.text(),
            &response.final_url,
            selector,
            self.config.sidebar_selector.as_deref(),
        )?;

        let (links, pdfs) = self.resolve_anchors(&page.main.anchors).await;

        let sidebar = match page.sidebar {
            Some((sidebar_selector, region)) => {
                let (links, pdfs) = self.resolve_anchors(&region.anchors).await;
                Some(SidebarContent { selector: sidebar_selector, links, pdfs, embeds: region.embeds })
            }
            None => None,
        };

        tracing::debug!(
            url = %response.final_url,
            links = links.len(),
            pdfs = pdfs.len(),
            embeds = page.main.embeds.len(),
            "analyzed page"
        );

        Ok(PageSnapshot {
            source_url: source_url.to_string(),
            final_url: Some(response.final_url.to_string()),
            selector: selector.to_string(),
            selector_matched: page.selector_matched,
            links,
            pdfs,
            embeds: page.main.embeds,
            sidebar,
            meta_description: page.meta_description,
            meta_robots: page.meta_robots,
            fetched_at: now_rfc3339(),
            error: None,
        })
    }

    /// Check every anchor's status and split them into links and PDFs,
    /// keeping document order within each.
    async fn resolve_anchors(&self, anchors: &[Anchor]) -> (Vec<LinkRecord>, Vec<LinkRecord>) {
        let hrefs: Vec<String> = anchors.iter().map(|a| a.href.to_string()).collect();
        let statuses = resolve_statuses(self.checker.as_ref(), &hrefs, self.config.status_concurrency).await;

        let mut links = Vec::new();
        let mut pdfs = Vec::new();
        for ((anchor, href), status) in anchors.iter().zip(hrefs).zip(statuses) {
            let pdf = anchor.is_pdf();
            tracing::debug!(href = %href, status = %status, pdf, "classified link");
            let record = LinkRecord::new(anchor.text.clone(), href, status);
            if pdf { pdfs.push(record) } else { links.push(record) }
        }
        (links, pdfs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use linker_core::{EmbedKind, UNCHECKED_STATUS};
    use std::collections::HashMap;

    /// Checker returning fixed statuses, "200" for anything unlisted.
    struct FixedStatuses(HashMap<String, String>);

    #[async_trait]
    impl StatusCheck for FixedStatuses {
        async fn status(&self, url: &str) -> String {
            self.0.get(url).cloned().unwrap_or_else(|| "200".to_string())
        }
    }

    fn make_extractor(checker: FixedStatuses, config: ExtractConfig) -> ContentExtractor {
        let fetch = FetchClient::new(FetchConfig::default()).unwrap();
        ContentExtractor::new(fetch, Arc::new(checker), config)
    }

    fn all_ok() -> FixedStatuses {
        FixedStatuses(HashMap::new())
    }

    async fn serve(server: &mut mockito::Server, path: &str, body: &str) -> mockito::Mock {
        server
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(body)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_analyze_main_region() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"
            <html><head><meta name="description" content="Student services"></head>
            <body>
                <nav><a href="/outside">Outside</a></nav>
                <div id="main">
                    <a href="/students">Students</a>
                    <a href="/docs/handbook.pdf">Handbook</a>
                    <a href="mailto:help@example.edu">Help</a>
                    <iframe src="https://player.vimeo.com/video/7" title="Welcome"></iframe>
                    <iframe src="https://www.youtube.com/embed/x"></iframe>
                </div>
            </body></html>
        "#;
        let _m = serve(&mut server, "/page", body).await;

        let mut statuses = HashMap::new();
        statuses.insert("mailto:help@example.edu".to_string(), UNCHECKED_STATUS.to_string());
        let extractor = make_extractor(FixedStatuses(statuses), ExtractConfig::default());
        let url = format!("{}/page", server.url());
        let snapshot = extractor.analyze(&url, "#main").await;

        assert!(snapshot.error.is_none());
        assert!(snapshot.selector_matched);
        assert_eq!(snapshot.source_url, url);
        assert_eq!(snapshot.links.len(), 2);
        assert_eq!(snapshot.links[0].text, "Students");
        assert_eq!(snapshot.links[0].href, format!("{}/students", server.url()));
        assert_eq!(snapshot.links[0].status, "200");
        assert_eq!(snapshot.links[1].status, UNCHECKED_STATUS);
        assert_eq!(snapshot.pdfs.len(), 1);
        assert_eq!(snapshot.pdfs[0].text, "Handbook");
        assert_eq!(snapshot.embeds.len(), 1);
        assert_eq!(snapshot.embeds[0].kind, EmbedKind::Vimeo);
        assert_eq!(snapshot.meta_description.as_deref(), Some("Student services"));
        assert!(snapshot.sidebar.is_none());
    }

    #[tokio::test]
    async fn test_selector_fallback_to_whole_document() {
        let mut server = mockito::Server::new_async().await;
        let _m = serve(&mut server, "/nomain", r#"<div id="content"><a href="/a">A</a></div><a href="/b">B</a>"#).await;

        let extractor = make_extractor(all_ok(), ExtractConfig::default());
        let snapshot = extractor.analyze(&format!("{}/nomain", server.url()), "#main").await;

        assert!(snapshot.error.is_none());
        assert!(!snapshot.selector_matched);
        assert_eq!(snapshot.links.len(), 2);
    }

    #[tokio::test]
    async fn test_mixed_case_pdf_is_classified() {
        let mut server = mockito::Server::new_async().await;
        let _m = serve(
            &mut server,
            "/pdfs",
            r#"<div id="main"><a href="https://example.com/foo.PDF">Foo</a><a href="https://example.com/foo">Page</a></div>"#,
        )
        .await;

        let extractor = make_extractor(all_ok(), ExtractConfig::default());
        let snapshot = extractor.analyze(&format!("{}/pdfs", server.url()), "#main").await;

        assert_eq!(snapshot.pdfs.len(), 1);
        assert_eq!(snapshot.pdfs[0].href, "https://example.com/foo.PDF");
        assert_eq!(snapshot.links.len(), 1);
        assert_eq!(snapshot.links[0].href, "https://example.com/foo");
    }

    #[tokio::test]
    async fn test_one_failed_status_among_ten() {
        let mut server = mockito::Server::new_async().await;
        let anchors: String = (0..10).map(|i| format!(r#"<a href="https://links.example/{i}">Link {i}</a>"#)).collect();
        let _m = serve(&mut server, "/ten", &format!(r#"<div id="main">{anchors}</div>"#)).await;

        let mut statuses = HashMap::new();
        statuses.insert("https://links.example/4".to_string(), UNCHECKED_STATUS.to_string());
        let config = ExtractConfig { status_concurrency: 4, ..ExtractConfig::default() };
        let extractor = make_extractor(FixedStatuses(statuses), config);
        let snapshot = extractor.analyze(&format!("{}/ten", server.url()), "#main").await;

        assert!(snapshot.error.is_none());
        assert_eq!(snapshot.links.len(), 10);
        for (i, link) in snapshot.links.iter().enumerate() {
            assert_eq!(link.text, format!("Link {i}"));
            let expected = if i == 4 { UNCHECKED_STATUS } else { "200" };
            assert_eq!(link.status, expected);
        }
    }

    #[tokio::test]
    async fn test_hrefs_resolve_against_final_url() {
        let mut server = mockito::Server::new_async().await;
        let _old = server
            .mock("GET", "/old/page")
            .with_status(301)
            .with_header("location", "/new/section/")
            .create_async()
            .await;
        let _new = serve(&mut server, "/new/section/", r#"<div id="main"><a href="child">Child</a></div>"#).await;

        let extractor = make_extractor(all_ok(), ExtractConfig::default());
        let snapshot = extractor.analyze(&format!("{}/old/page", server.url()), "#main").await;

        assert_eq!(snapshot.final_url, Some(format!("{}/new/section/", server.url())));
        assert_eq!(snapshot.links[0].href, format!("{}/new/section/child", server.url()));
    }

    #[tokio::test]
    async fn test_http_error_gives_failed_snapshot() {
        let mut server = mockito::Server::new_async().await;
        let _m = server.mock("GET", "/missing").with_status(404).create_async().await;

        let extractor = make_extractor(all_ok(), ExtractConfig::default());
        let snapshot = extractor.analyze(&format!("{}/missing", server.url()), "#main").await;

        assert!(snapshot.is_failed());
        assert!(snapshot.error.as_deref().unwrap().starts_with("HTTP_ERROR"));
        assert!(snapshot.links.is_empty() && snapshot.pdfs.is_empty() && snapshot.embeds.is_empty());
        assert!(snapshot.final_url.is_none());
    }

    #[tokio::test]
    async fn test_network_failure_gives_failed_snapshot() {
        let extractor = make_extractor(all_ok(), ExtractConfig::default());
        let snapshot = extractor.analyze("127.0.0.1:1/page", "#main").await;

        assert_eq!(snapshot.source_url, "http://127.0.0.1:1/page");
        assert!(snapshot.is_failed());
        assert!(snapshot.links.is_empty());
    }

    #[tokio::test]
    async fn test_empty_url_gives_network_failure() {
        let extractor = make_extractor(all_ok(), ExtractConfig::default());
        let snapshot = extractor.analyze("", "#main").await;

        assert_eq!(snapshot.source_url, "http://");
        assert!(snapshot.error.as_deref().unwrap().starts_with("NETWORK_ERROR"));
        assert!(snapshot.links.is_empty() && snapshot.pdfs.is_empty() && snapshot.embeds.is_empty());
    }

    #[tokio::test]
    async fn test_non_html_content_type_is_still_extracted() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/plain")
            .with_status(200)
            .with_header("content-type", "text/plain")
            .with_body(r#"<div id="main"><a href="/a">A</a></div>"#)
            .create_async()
            .await;

        let extractor = make_extractor(all_ok(), ExtractConfig::default());
        let snapshot = extractor.analyze(&format!("{}/plain", server.url()), "#main").await;

        assert!(snapshot.error.is_none());
        assert_eq!(snapshot.links.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_selector_fails_before_fetch() {
        let extractor = make_extractor(all_ok(), ExtractConfig::default());
        let snapshot = extractor.analyze("http://127.0.0.1:1/", "div[[").await;
        assert!(snapshot.error.as_deref().unwrap().starts_with("EXTRACT_FAILED"));
    }

    #[tokio::test]
    async fn test_sidebar_extraction() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"
            <div id="main"><a href="/main">Main</a></div>
            <div id="sidebar-components">
                <a href="/side">Side</a>
                <a href="/side.pdf">Side PDF</a>
                <iframe src="https://player.vimeo.com/video/1"></iframe>
            </div>
        "#;
        let _m = serve(&mut server, "/side", body).await;

        let config = ExtractConfig { sidebar_selector: Some("#sidebar-components".into()), ..ExtractConfig::default() };
        let extractor = make_extractor(all_ok(), config);
        let snapshot = extractor.analyze(&format!("{}/side", server.url()), "#main").await;

        assert_eq!(snapshot.links.len(), 1);
        let sidebar = snapshot.sidebar.unwrap();
        assert_eq!(sidebar.selector, "#sidebar-components");
        assert_eq!(sidebar.links.len(), 1);
        assert_eq!(sidebar.pdfs.len(), 1);
        assert_eq!(sidebar.embeds.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_sidebar_does_not_fall_back() {
        let mut server = mockito::Server::new_async().await;
        let _m = serve(&mut server, "/plain", r#"<div id="main"><a href="/main">Main</a></div>"#).await;

        let config = ExtractConfig { sidebar_selector: Some("#sidebar-components".into()), ..ExtractConfig::default() };
        let extractor = make_extractor(all_ok(), config);
        let snapshot = extractor.analyze(&format!("{}/plain", server.url()), "#main").await;

        let sidebar = snapshot.sidebar.unwrap();
        assert!(sidebar.links.is_empty() && sidebar.pdfs.is_empty() && sidebar.embeds.is_empty());
    }

    #[test]
    fn test_parse_page_meta_robots() {
        let base = Url::parse("https://example.com/").unwrap();
        let page = parse_page(r#"<meta name="Robots" content="NOINDEX"><div id="main"></div>"#, &base, "#main", None)
            .unwrap();
        assert_eq!(page.meta_robots.as_deref(), Some("NOINDEX"));
        assert!(page.selector_matched);
        assert!(page.sidebar.is_none());
    }
}

//! Report assembly.
//!
//! A [`Report`] is the complete, renderer-ready view of one analysis: source
//! metadata, every link, PDF and embed with its status and reconciliation
//! outcome, and the hierarchy comparison. Renderers only format it.

pub mod hierarchy;
pub mod html;

pub use hierarchy::{HierarchyComparison, path_segments};
pub use html::{render_html, write_report};

use serde::Serialize;
use url::Url;

use crate::reconcile::{LinkScope, Reconciliation, ReconciliationEntry, ReconciliationSummary};
use linker_core::cache::cache_key;
use linker_core::snapshot::now_rfc3339;
use linker_core::{CacheIdentity, EmbedRecord, LinkRecord, PageSnapshot, UNCHECKED_STATUS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Link,
    Pdf,
    Embed,
    SidebarLink,
    SidebarPdf,
    SidebarEmbed,
}

impl ItemKind {
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Link => "Link",
            ItemKind::Pdf => "PDF",
            ItemKind::Embed => "Embed",
            ItemKind::SidebarLink => "Sidebar Link",
            ItemKind::SidebarPdf => "Sidebar PDF",
            ItemKind::SidebarEmbed => "Sidebar Embed",
        }
    }
}

/// Coarse status bucket used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    Ok,
    NotFound,
    Unchecked,
    Other,
}

impl StatusClass {
    pub fn from_status(status: &str) -> Self {
        match status.trim() {
            "200" => StatusClass::Ok,
            "404" => StatusClass::NotFound,
            s if s == UNCHECKED_STATUS || s.parse::<u16>().is_err() => StatusClass::Unchecked,
            _ => StatusClass::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusClass::Ok => "ok",
            StatusClass::NotFound => "not_found",
            StatusClass::Unchecked => "unchecked",
            StatusClass::Other => "other",
        }
    }
}

/// Value offered for copying: `tel:` numbers in E.164 form, PDFs as their
/// path, anything else unchanged.
pub fn copy_value(href: &str) -> String {
    let lower = href.to_ascii_lowercase();
    if lower.starts_with("tel:") {
        let digits: String = href[4..].chars().filter(char::is_ascii_digit).collect();
        return match digits.len() {
            10 => format!("tel:+1{digits}"),
            11 if digits.starts_with('1') => format!("tel:+{digits}"),
            _ => href.to_string(),
        };
    }
    if (lower.ends_with(".pdf") || lower.contains("/pdf/"))
        && let Ok(url) = Url::parse(href)
    {
        return url.path().to_string();
    }
    href.to_string()
}

/// Mapping outcome attached to a main-region link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemMapping {
    pub scope: LinkScope,
    pub mapped: bool,
    pub proposed_path: Option<String>,
    pub row_number: Option<u32>,
}

impl From<&ReconciliationEntry> for ItemMapping {
    fn from(entry: &ReconciliationEntry) -> Self {
        Self {
            scope: entry.scope,
            mapped: entry.mapped,
            proposed_path: entry.proposed_path.clone(),
            row_number: entry.row_number,
        }
    }
}

/// One listed link, PDF or embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportItem {
    pub kind: ItemKind,
    pub text: String,
    pub href: String,
    /// None for embeds, which are never status-checked.
    pub status: Option<String>,
    pub status_class: Option<StatusClass>,
    pub copy_value: String,
    pub mapping: Option<ItemMapping>,
}

impl ReportItem {
    fn from_link(kind: ItemKind, link: &LinkRecord, mapping: Option<ItemMapping>) -> Self {
        Self {
            kind,
            text: link.text.clone(),
            href: link.href.clone(),
            status: Some(link.status.clone()),
            status_class: Some(StatusClass::from_status(&link.status)),
            copy_value: copy_value(&link.href),
            mapping,
        }
    }

    fn from_embed(kind: ItemKind, embed: &EmbedRecord) -> Self {
        Self {
            kind,
            text: embed.title.clone(),
            href: embed.src.clone(),
            status: None,
            status_class: None,
            copy_value: embed.src.clone(),
            mapping: None,
        }
    }
}

/// Where the analyzed page came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSource {
    pub url: String,
    pub final_url: Option<String>,
    pub selector: String,
    pub selector_matched: bool,
    pub fetched_at: String,
    pub domain: Option<String>,
    pub row: Option<u32>,
    pub existing_url: Option<String>,
    pub proposed_path: Option<String>,
    pub meta_description: Option<String>,
    pub meta_robots: Option<String>,
    pub error: Option<String>,
    /// Share of links that are not `tel:`/`mailto:`, in `0.0..=1.0`.
    pub difficulty: f64,
}

/// DSM context of a report.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportContext<'a> {
    pub domain: Option<&'a str>,
    pub row: Option<u32>,
    pub existing_url: Option<&'a str>,
    pub proposed_path: Option<&'a str>,
}

/// Renderer-ready report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub source: ReportSource,
    pub items: Vec<ReportItem>,
    pub summary: Option<ReconciliationSummary>,
    pub hierarchy: HierarchyComparison,
    pub generated_at: String,
}

impl Report {
    pub fn items_of(&self, kind: ItemKind) -> impl Iterator<Item = &ReportItem> {
        self.items.iter().filter(move |item| item.kind == kind)
    }
}

/// Assemble a report from a snapshot and its optional reconciliation.
///
/// Reconciliation entries are matched to main-region links by position.
pub fn build_report(
    snapshot: &PageSnapshot,
    reconciliation: Option<&Reconciliation>,
    context: &ReportContext<'_>,
) -> Report {
    let entries = reconciliation.map(|r| r.entries.as_slice()).unwrap_or(&[]);

    let mut items = Vec::new();
    for (i, link) in snapshot.links.iter().enumerate() {
        let mapping = entries.get(i).filter(|e| e.link.href == link.href).map(ItemMapping::from);
        items.push(ReportItem::from_link(ItemKind::Link, link, mapping));
    }
    items.extend(snapshot.pdfs.iter().map(|pdf| ReportItem::from_link(ItemKind::Pdf, pdf, None)));
    items.extend(snapshot.embeds.iter().map(|embed| ReportItem::from_embed(ItemKind::Embed, embed)));

    if let Some(sidebar) = &snapshot.sidebar {
        items.extend(sidebar.links.iter().map(|l| ReportItem::from_link(ItemKind::SidebarLink, l, None)));
        items.extend(sidebar.pdfs.iter().map(|p| ReportItem::from_link(ItemKind::SidebarPdf, p, None)));
        items.extend(sidebar.embeds.iter().map(|e| ReportItem::from_embed(ItemKind::SidebarEmbed, e)));
    }

    let existing_for_hierarchy = context.existing_url.filter(|u| !u.is_empty()).unwrap_or(&snapshot.source_url);
    let hierarchy = HierarchyComparison::new(existing_for_hierarchy, context.proposed_path.unwrap_or(""));

    Report {
        source: ReportSource {
            url: snapshot.source_url.clone(),
            final_url: snapshot.final_url.clone(),
            selector: snapshot.selector.clone(),
            selector_matched: snapshot.selector_matched,
            fetched_at: snapshot.fetched_at.clone(),
            domain: context.domain.map(str::to_string),
            row: context.row,
            existing_url: context.existing_url.map(str::to_string),
            proposed_path: context.proposed_path.map(str::to_string),
            meta_description: snapshot.meta_description.clone(),
            meta_robots: snapshot.meta_robots.clone(),
            error: snapshot.error.clone(),
            difficulty: snapshot.difficulty(),
        },
        items,
        summary: reconciliation.map(|r| r.summary),
        hierarchy,
        generated_at: now_rfc3339(),
    }
}

/// File name for a report: `{domain}_{row}.html` for DSM rows, otherwise
/// `page_{cache key}.html`.
pub fn report_file_name(context: &ReportContext<'_>, source_url: &str) -> String {
    match (context.domain, context.row) {
        (Some(domain), Some(row)) => {
            let clean: String = domain
                .to_lowercase()
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect();
            format!("{clean}_{row}.html")
        }
        _ => format!("page_{}.html", cache_key(&CacheIdentity::url(source_url))),
    }
}

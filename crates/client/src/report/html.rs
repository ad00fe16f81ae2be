//! Self-contained HTML rendering of a [`Report`].

use std::path::{Path, PathBuf};

use html_escape::{encode_double_quoted_attribute, encode_text};
use url::Url;

use super::{ItemKind, Report, ReportItem, StatusClass};
use crate::reconcile::LinkScope;
use linker_core::Error;

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:2rem;max-width:70rem}\
table{border-collapse:collapse;width:100%}td,th{border:1px solid #ddd;padding:.3rem .5rem;text-align:left}\
.ok{color:#1a7f37}.not_found{color:#cf222e}.unchecked{color:#6e7781}.other{color:#9a6700}\
.unmapped{background:#fff8c5}.error{color:#cf222e;font-weight:bold}.meta{color:#57606a}";

fn status_cell(item: &ReportItem) -> String {
    match (&item.status, item.status_class) {
        (Some(status), Some(class)) => {
            format!(r#"<td class="{}">{}</td>"#, class.as_str(), encode_text(status))
        }
        _ => "<td></td>".to_string(),
    }
}

fn mapping_cell(item: &ReportItem) -> String {
    match &item.mapping {
        Some(m) if m.scope == LinkScope::External => "<td>external</td>".to_string(),
        Some(m) if m.mapped => format!(
            "<td>{} <span class=\"meta\">(row {})</span></td>",
            encode_text(m.proposed_path.as_deref().unwrap_or("")),
            m.row_number.map(|r| r.to_string()).unwrap_or_default()
        ),
        Some(_) => "<td class=\"unmapped\">unmapped</td>".to_string(),
        None => "<td></td>".to_string(),
    }
}

/// Whether `href` is safe to render as a clickable link.
fn is_linkable(href: &str) -> bool {
    Url::parse(href).is_ok_and(|url| matches!(url.scheme(), "http" | "https" | "mailto" | "tel"))
}

fn target_cell(href: &str) -> String {
    if is_linkable(href) {
        format!(
            r#"<td><a href="{}" target="_blank" rel="noopener noreferrer">{}</a></td>"#,
            encode_double_quoted_attribute(href),
            encode_text(href)
        )
    } else {
        format!("<td>{}</td>", encode_text(href))
    }
}

/// Append `line` and a newline.
fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

fn render_items(out: &mut String, report: &Report) {
    if report.items.is_empty() {
        push_line(out, "<p><em>No links or resources found.</em></p>");
        return;
    }

    push_line(out, "<table>\n<tr><th>Type</th><th>Status</th><th>Text</th><th>Target</th><th>Copy</th><th>Mapping</th></tr>");
    for item in &report.items {
        push_line(
            out,
            &format!(
                "<tr><td>{}</td>{}<td>{}</td>{}<td><code>{}</code></td>{}</tr>",
                item.kind.label(),
                status_cell(item),
                encode_text(&item.text),
                target_cell(&item.href),
                encode_text(&item.copy_value),
                mapping_cell(item),
            ),
        );
    }
    push_line(out, "</table>");
}

fn render_hierarchy(out: &mut String, report: &Report) {
    let h = &report.hierarchy;
    push_line(out, "<h2>Hierarchy</h2>\n<table>\n<tr><th>Existing</th><th>Proposed</th></tr>");
    push_line(out, &format!("<tr><td>{0}</td><td>{0}</td></tr>", encode_text(&h.root)));
    for (existing, proposed) in h.side_by_side() {
        push_line(
            out,
            &format!(
                "<tr><td>{}</td><td>{}</td></tr>",
                encode_text(existing.unwrap_or("")),
                encode_text(proposed.unwrap_or(""))
            ),
        );
    }
    push_line(out, "</table>");
}

/// Render a complete HTML document. All page-derived text is escaped.
pub fn render_html(report: &Report) -> String {
    let src = &report.source;
    let title = match (&src.domain, src.row) {
        (Some(domain), Some(row)) => format!("{domain} row {row}"),
        _ => src.url.clone(),
    };

    let mut out = String::new();
    push_line(
        &mut out,
        &format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>",
            encode_text(&title)
        ),
    );
    push_line(&mut out, &format!("<h1>{}</h1>", encode_text(&title)));

    push_line(&mut out, "<table class=\"source\">");
    let mut row = |label: &str, value: &str| {
        push_line(&mut out, &format!("<tr><th>{label}</th><td>{}</td></tr>", encode_text(value)));
    };
    row("URL", &src.url);
    if let Some(final_url) = &src.final_url {
        row("Final URL", final_url);
    }
    row("Selector", &src.selector);
    if !src.selector_matched && src.error.is_none() {
        row("Selector match", "no match, whole document used");
    }
    if let Some(existing) = &src.existing_url {
        row("Existing URL", existing);
    }
    if let Some(proposed) = &src.proposed_path {
        row("Proposed path", proposed);
    }
    if let Some(description) = &src.meta_description {
        row("Description", description);
    }
    if let Some(robots) = &src.meta_robots {
        row("Robots", robots);
    }
    row("Fetched", &src.fetched_at);
    row("Difficulty", &format!("{:.0}%", src.difficulty * 100.0));
    push_line(&mut out, "</table>");

    if let Some(error) = &src.error {
        push_line(&mut out, &format!("<p class=\"error\">{}</p>", encode_text(error)));
    }

    if let Some(summary) = &report.summary {
        push_line(
            &mut out,
            &format!(
                "<p>Internal: {} (mapped {}, unmapped {}), external: {}</p>",
                summary.total_internal, summary.mapped, summary.unmapped, summary.external
            ),
        );
    }

    let counts = [ItemKind::Link, ItemKind::Pdf, ItemKind::Embed]
        .iter()
        .map(|kind| format!("{}: {}", kind.label(), report.items_of(*kind).count()))
        .collect::<Vec<_>>()
        .join(", ");
    let broken = report.items.iter().filter(|i| i.status_class == Some(StatusClass::NotFound)).count();
    push_line(&mut out, &format!("<h2>Links &amp; Resources</h2>\n<p class=\"meta\">{counts}; broken: {broken}</p>"));

    render_items(&mut out, report);
    render_hierarchy(&mut out, report);

    push_line(
        &mut out,
        &format!("<p class=\"meta\">Generated {}</p>\n</body>\n</html>", encode_text(&report.generated_at)),
    );
    out
}

/// Render `report` and write it to `dir/file_name`, creating `dir` if needed.
pub async fn write_report(report: &Report, dir: &Path, file_name: &str) -> Result<PathBuf, Error> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Error::Report(format!("failed to create {}: {e}", dir.display())))?;

    let path = dir.join(file_name);
    tokio::fs::write(&path, render_html(report))
        .await
        .map_err(|e| Error::Report(format!("failed to write {}: {e}", path.display())))?;

    tracing::info!(path = %path.display(), "wrote report");
    Ok(path)
}

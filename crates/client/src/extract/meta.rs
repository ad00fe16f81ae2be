//! `<meta name=...>` lookups.

use scraper::{Html, Selector};

/// Content of the first `<meta>` whose `name` equals `name`, ignoring case.
pub fn meta_content(document: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse("meta[name][content]").ok()?;
    document
        .select(&selector)
        .find(|meta| meta.value().attr("name").is_some_and(|n| n.trim().eq_ignore_ascii_case(name)))
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

//! Content region selection.

use scraper::{ElementRef, Html, Selector};

use linker_core::Error;

/// How the content region was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionMatch {
    /// The selector matched an element.
    Selected,
    /// Nothing matched; the whole document stands in.
    WholeDocument,
}

/// Parse a CSS selector, mapping failures to `ExtractFailed`.
pub fn parse_selector(selector: &str) -> Result<Selector, Error> {
    Selector::parse(selector).map_err(|e| Error::ExtractFailed(format!("invalid selector '{selector}': {e}")))
}

/// First element matching `selector`, if any.
pub fn find_region<'a>(document: &'a Html, selector: &str) -> Result<Option<ElementRef<'a>>, Error> {
    let parsed = parse_selector(selector)?;
    Ok(document.select(&parsed).next())
}

/// The main content region: the first match for `selector`, or the whole
/// document when nothing matches.
pub fn select_region<'a>(document: &'a Html, selector: &str) -> Result<(ElementRef<'a>, RegionMatch), Error> {
    match find_region(document, selector)? {
        Some(element) => Ok((element, RegionMatch::Selected)),
        None => Ok((document.root_element(), RegionMatch::WholeDocument)),
    }
}

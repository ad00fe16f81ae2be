//! URL normalization for page requests.

/// Error type for page URL parsing failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("URL has no host")]
    MissingHost,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Whether `input` starts with `scheme://`, where the scheme is a letter
/// followed by letters, digits, `+`, `-` or `.`.
fn has_scheme(input: &str) -> bool {
    let Some((scheme, _)) = input.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Normalize user input into an absolute URL string.
///
/// Input that already starts with a scheme is returned unchanged; anything
/// else gets an `http://` prefix. Never fails: empty input becomes `http://`
/// and non-http schemes are rejected later at fetch time.
pub fn normalize_url(input: &str) -> String {
    if has_scheme(input) { input.to_string() } else { format!("http://{input}") }
}

/// Parse a normalized URL for fetching.
///
/// Only http and https are fetchable.
pub fn parse_page_url(normalized: &str) -> Result<url::Url, UrlError> {
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let parsed = url::Url::parse(trimmed).map_err(|e| match e {
        url::ParseError::EmptyHost => UrlError::MissingHost,
        e => UrlError::InvalidUrl(e.to_string()),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }
}

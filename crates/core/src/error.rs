//! Unified error types for linker.
//!
//! Every variant renders with a stable upper-case code prefix so command
//! output and logs can be grepped by failure class.

/// Unified error types for the linker core and client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed command input (e.g., non-integer row number).
    #[error("MALFORMED_INPUT: {0}")]
    MalformedInput(String),

    /// URL could not be parsed.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Network-level failure (DNS, connection refused, TLS).
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Non-success HTTP response.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Content extraction failed.
    #[error("EXTRACT_FAILED: {0}")]
    ExtractFailed(String),

    /// Spreadsheet missing or unreadable.
    #[error("DATA_SOURCE_ERROR: {0}")]
    DataSource(String),

    /// Domain name not in the whitelist.
    #[error("UNKNOWN_DOMAIN: '{name}' not found. Valid domains: {}", .valid.join(", "))]
    UnknownDomain { name: String, valid: Vec<String> },

    /// Row has no existing URL: blank, beyond the end of the sheet, or only a proposed path.
    #[error("ROW_NOT_FOUND: could not find a URL in {domain} row {row}")]
    RowNotFound { domain: String, row: u32 },

    /// A mapping operation ran before any spreadsheet was loaded.
    #[error("NO_MAPPING: no DSM spreadsheet loaded")]
    NoMappingLoaded,

    /// No cache entry for the given identity.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// Cache read/write failed.
    #[error("CACHE_ERROR: {0}")]
    Cache(String),

    /// Report could not be written.
    #[error("REPORT_ERROR: {0}")]
    Report(String),
}

impl Error {
    /// Whether this error belongs to the network family (fetch or status check).
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::FetchTimeout(_) | Error::FetchTooLarge(_) | Error::HttpError(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Cache(format!("json: {err}"))
    }
}

impl From<calamine::Error> for Error {
    fn from(err: calamine::Error) -> Self {
        Error::DataSource(err.to_string())
    }
}

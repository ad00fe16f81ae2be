//! HTTP fetch pipeline.
//!
//! ### URL Normalization
//! - Input without a `scheme://` prefix gets `http://`
//! - Only http and https are fetched
//!
//! ### Limits
//! - Bounded timeout per request (30s for pages, 10s for status checks)
//! - Max redirects: 10 (configurable)
//! - Max body bytes: 5MB (configurable)
//!
//! ### Status Checks
//! - HEAD request per link, redirects followed
//! - Any failure yields the `"0"` sentinel instead of an error

pub mod status;
pub mod url;

use bytes::Bytes;
use reqwest::Url;
use reqwest::{Client, header};
use std::time::{Duration, Instant};

pub use status::{HttpStatusResolver, StatusCheck, resolve_statuses};
pub use url::{UrlError, normalize_url, parse_page_url};

use linker_core::{AppConfig, Error};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "linker/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 30s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 10)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "linker/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(30000),
            max_redirects: 10,
        }
    }
}

impl FetchConfig {
    /// Page fetch settings from the application config.
    pub fn for_pages(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.page_timeout(),
            max_redirects: config.max_redirects,
        }
    }

    /// Status check settings from the application config.
    pub fn for_status(config: &AppConfig) -> Self {
        Self { timeout: config.status_timeout(), ..Self::for_pages(config) }
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The final URL after redirects
    pub final_url: Url,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response body bytes
    pub bytes: Bytes,
}

impl FetchResponse {
    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Build a reqwest client with the shared settings.
pub(crate) fn build_http_client(config: &FetchConfig) -> Result<Client, Error> {
    Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout)
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        .use_rustls_tls()
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
        .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))
}

/// Map a reqwest error into the network error family.
pub(crate) fn classify_error(url: &Url, err: &reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(format!("{url}: {err}"))
    } else {
        Error::Network(format!("{url}: {err}"))
    }
}

/// HTTP client for page fetches.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = build_http_client(&config)?;
        Ok(Self { http, config })
    }

    /// Fetch a URL, returning raw bytes and metadata.
    ///
    /// Follows redirects and enforces the byte limit. Any non-2xx response is
    /// an error.
    pub async fn fetch(&self, url_str: &str) -> Result<FetchResponse, Error> {
        let start = Instant::now();
        let url = parse_page_url(url_str).map_err(|e| match e {
            // Nothing to connect to: reported like any other unreachable page.
            UrlError::Empty | UrlError::MissingHost => Error::Network(format!("'{url_str}': {e}")),
            e => Error::InvalidUrl(format!("{url_str}: {e}")),
        })?;

        let request = self
            .http
            .get(url.as_str())
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8");

        let response = request.send().await.map_err(|e| classify_error(&url, &e))?;

        let status = response.status();

        if !status.is_success() {
            return Err(Error::HttpError(format!("{} returned status {}", url, status.as_u16())));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response.bytes().await.map_err(|e| classify_error(&url, &e))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!("fetched {} -> {} in {}ms ({} bytes)", url, final_url, fetch_ms, bytes.len());

        Ok(FetchResponse { final_url, content_type, bytes })
    }
}

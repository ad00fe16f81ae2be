//! Per-link HTTP status resolution.

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use reqwest::Client;
use url::Url;

use super::{FetchConfig, build_http_client};
use linker_core::{Error, UNCHECKED_STATUS};

/// Resolves the HTTP status of a single link.
///
/// Implementations never fail: anything that prevents a real status code
/// yields [`UNCHECKED_STATUS`].
#[async_trait]
pub trait StatusCheck: Send + Sync {
    async fn status(&self, url: &str) -> String;
}

/// Status check issuing a HEAD request with redirects followed.
#[derive(Debug, Clone)]
pub struct HttpStatusResolver {
    http: Client,
}

impl HttpStatusResolver {
    pub fn new(config: &FetchConfig) -> Result<Self, Error> {
        Ok(Self { http: build_http_client(config)? })
    }
}

#[async_trait]
impl StatusCheck for HttpStatusResolver {
    async fn status(&self, url: &str) -> String {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(url, error = %e, "unparsable link, status unchecked");
                return UNCHECKED_STATUS.to_string();
            }
        };

        if !matches!(parsed.scheme(), "http" | "https") {
            tracing::debug!(url, scheme = parsed.scheme(), "non-http link, status unchecked");
            return UNCHECKED_STATUS.to_string();
        }

        match self.http.head(parsed).send().await {
            Ok(response) => response.status().as_u16().to_string(),
            Err(e) => {
                tracing::debug!(url, error = %e, timeout = e.is_timeout(), "status check failed, using sentinel");
                UNCHECKED_STATUS.to_string()
            }
        }
    }
}

/// Resolve the status of every URL, keeping input order.
///
/// At most `concurrency` checks run at once; 1 checks them one by one.
pub async fn resolve_statuses(checker: &dyn StatusCheck, urls: &[String], concurrency: usize) -> Vec<String> {
    stream::iter(urls)
        .map(|url| checker.status(url))
        .buffered(concurrency.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_resolver(timeout: Duration) -> HttpStatusResolver {
        let config = FetchConfig { timeout, ..FetchConfig::default() };
        HttpStatusResolver::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_head_status_codes() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server.mock("HEAD", "/ok").with_status(200).create_async().await;
        let _gone = server.mock("HEAD", "/gone").with_status(404).create_async().await;

        let resolver = test_resolver(Duration::from_secs(5));
        assert_eq!(resolver.status(&format!("{}/ok", server.url())).await, "200");
        assert_eq!(resolver.status(&format!("{}/gone", server.url())).await, "404");
    }

    #[tokio::test]
    async fn test_head_follows_redirects() {
        let mut server = mockito::Server::new_async().await;
        let _moved = server
            .mock("HEAD", "/moved")
            .with_status(302)
            .with_header("location", "/here")
            .create_async()
            .await;
        let _here = server.mock("HEAD", "/here").with_status(200).create_async().await;

        let resolver = test_resolver(Duration::from_secs(5));
        assert_eq!(resolver.status(&format!("{}/moved", server.url())).await, "200");
    }

    #[tokio::test]
    async fn test_non_http_schemes_are_unchecked() {
        let resolver = test_resolver(Duration::from_secs(5));
        assert_eq!(resolver.status("mailto:someone@example.com").await, UNCHECKED_STATUS);
        assert_eq!(resolver.status("tel:8435551234").await, UNCHECKED_STATUS);
        assert_eq!(resolver.status("not a url").await, UNCHECKED_STATUS);
    }

    #[tokio::test]
    async fn test_connection_failure_is_unchecked() {
        let resolver = test_resolver(Duration::from_secs(5));
        assert_eq!(resolver.status("http://127.0.0.1:1/").await, UNCHECKED_STATUS);
    }

    #[tokio::test]
    async fn test_timeout_is_unchecked() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _hold = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let resolver = test_resolver(Duration::from_millis(200));
        assert_eq!(resolver.status(&format!("http://{addr}/slow")).await, UNCHECKED_STATUS);
    }

    struct EchoStatus;

    #[async_trait]
    impl StatusCheck for EchoStatus {
        async fn status(&self, url: &str) -> String {
            let n: u64 = url.rsplit('/').next().and_then(|s| s.parse().ok()).unwrap_or(0);
            // Later URLs finish first.
            tokio::time::sleep(Duration::from_millis(50u64.saturating_sub(n * 5))).await;
            format!("{}", 200 + n)
        }
    }

    #[tokio::test]
    async fn test_resolve_statuses_keeps_order() {
        let urls: Vec<String> = (0..8).map(|i| format!("https://example.com/{i}")).collect();
        let statuses = resolve_statuses(&EchoStatus, &urls, 4).await;
        let expected: Vec<String> = (0..8).map(|i| format!("{}", 200 + i)).collect();
        assert_eq!(statuses, expected);

        let sequential = resolve_statuses(&EchoStatus, &urls, 0).await;
        assert_eq!(sequential, expected);
    }
}

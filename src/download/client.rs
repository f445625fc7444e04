//! HTTP client wrapper for fetching source images.
//!
//! This module provides the `HttpClient` struct which handles streaming
//! fetches with proper timeout configuration and error handling.

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, FETCH_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::source::{DEFAULT_SOURCE_HOST, rewrite_share_link};
use crate::user_agent;

/// HTTP client for fetching source images into memory.
///
/// This client is designed to be created once and shared by every worker,
/// taking advantage of connection pooling.
///
/// # Example
///
/// ```no_run
/// use migrator_core::download::HttpClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let bytes = client.fetch_bytes("https://www.dropbox.com/s/abc/photo.jpg?dl=0").await?;
/// println!("Fetched {} bytes", bytes.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    source_host: String,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with the default 30 second fetch timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .expect("failed to build HTTP client with static configuration")
    }

    /// Creates a new HTTP client with an explicit total fetch timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Client`] when the underlying client cannot
    /// be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self, DownloadError> {
        let connect_timeout = Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout);
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .map_err(|source| DownloadError::Client { source })?;
        debug!(timeout_ms = timeout.as_millis(), "built fetch client");
        Ok(Self {
            client,
            source_host: DEFAULT_SOURCE_HOST.to_string(),
        })
    }

    /// Sets the host whose share links are rewritten to direct downloads.
    #[must_use]
    pub fn with_source_host(mut self, source_host: impl Into<String>) -> Self {
        self.source_host = source_host.into();
        self
    }

    /// Fetches the bytes behind `url`.
    ///
    /// Share links on the configured source host are rewritten from preview
    /// (`dl=0`) to direct download (`dl=1`) before the request is sent.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The URL is invalid
    /// - The request fails (network error, timeout)
    /// - The server returns an error status (4xx, 5xx)
    /// - The body stream breaks part way through
    #[must_use = "fetch result contains the downloaded bytes"]
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        let result = self.fetch_inner(url).await;
        if let Err(error) = &result {
            warn!(error = %error, "fetch failed");
        }
        result
    }

    async fn fetch_inner(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        let direct_url = rewrite_share_link(url.trim(), &self.source_host);
        Url::parse(&direct_url).map_err(|_| DownloadError::invalid_url(url))?;
        debug!(direct_url = %direct_url, "starting fetch");

        let response = self
            .client
            .get(&direct_url)
            .send()
            .await
            .map_err(|e| DownloadError::network(direct_url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(direct_url, status.as_u16()));
        }

        let capacity = response
            .content_length()
            .and_then(|len| usize::try_from(len).ok())
            .unwrap_or(0);
        let mut body = Vec::with_capacity(capacity);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DownloadError::network(direct_url.as_str(), e))?;
            body.extend_from_slice(&chunk);
        }

        info!(bytes = body.len(), "fetch complete");
        Ok(body)
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn local_client() -> HttpClient {
        HttpClient::with_timeout(Duration::from_secs(5))
            .unwrap()
            .with_source_host("127.0.0.1")
    }

    #[tokio::test]
    async fn test_fetch_bytes_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/photo.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"JPEG bytes".to_vec()))
            .mount(&mock_server)
            .await;

        let url = format!("{}/photo.jpg", mock_server.uri());
        let bytes = local_client().fetch_bytes(&url).await.unwrap();
        assert_eq!(bytes, b"JPEG bytes");
    }

    #[tokio::test]
    async fn test_fetch_bytes_rewrites_preview_link() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/s/abc/photo.jpg"))
            .and(query_param("dl", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"raw".to_vec()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let url = format!("{}/s/abc/photo.jpg?dl=0", mock_server.uri());
        let bytes = local_client().fetch_bytes(&url).await.unwrap();
        assert_eq!(bytes, b"raw");
    }

    #[tokio::test]
    async fn test_fetch_bytes_http_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let url = format!("{}/missing.jpg", mock_server.uri());
        let result = local_client().fetch_bytes(&url).await;
        match result {
            Err(DownloadError::HttpStatus { status, url }) => {
                assert_eq!(status, 404);
                assert!(url.ends_with("/missing.jpg"));
            }
            other => panic!("expected HttpStatus error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_bytes_invalid_url() {
        let result = HttpClient::new().fetch_bytes("not a url").await;
        assert!(matches!(result, Err(DownloadError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_fetch_bytes_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow.jpg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"late".to_vec())
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let client = HttpClient::with_timeout(Duration::from_millis(200)).unwrap();
        let url = format!("{}/slow.jpg", mock_server.uri());
        let result = client.fetch_bytes(&url).await;
        assert!(
            matches!(result, Err(DownloadError::Timeout { .. })),
            "expected timeout, got {result:?}"
        );
    }
}

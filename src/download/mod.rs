//! HTTP blob fetcher for source images.
//!
//! This module retrieves the raw bytes behind a source URL. Share links are
//! rewritten to their direct-download form before the request is issued.
//!
//! # Features
//!
//! - Streaming GET collected into memory (product images are small)
//! - Fixed request timeout (30s by default)
//! - Structured error types with full context
//! - [`BlobFetcher`] trait so the orchestrator can run against test doubles
//!
//! # Example
//!
//! ```no_run
//! use migrator_core::download::HttpClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let bytes = client
//!     .fetch_bytes("https://www.dropbox.com/s/abc/photo.jpg?dl=0")
//!     .await?;
//! println!("Fetched {} bytes", bytes.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;

pub use client::HttpClient;
pub use constants::{CONNECT_TIMEOUT_SECS, FETCH_TIMEOUT_SECS};
pub use error::DownloadError;

use async_trait::async_trait;

/// Retrieves the bytes behind a URL.
///
/// Implementations must report every failure through the returned error and
/// never panic; the orchestrator treats an `Err` as "no mapping for this URL"
/// and moves on.
#[async_trait]
pub trait BlobFetcher: Send + Sync {
    /// Fetches the full payload for `url`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on transport failure, timeout, or a
    /// non-success HTTP status.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError>;
}

#[async_trait]
impl BlobFetcher for HttpClient {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        self.fetch_bytes(url).await
    }
}

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.

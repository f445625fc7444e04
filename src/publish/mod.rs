//! Idempotent asset publishing to a remote content store.
//!
//! # Architecture
//!
//! - [`AssetStore`] - Async capability trait: lookup, create, update
//! - [`GitHubStore`] - Store backed by the GitHub repository contents API
//! - [`MemoryStore`] - In-process store with the same revision semantics
//! - [`AssetPublisher`] - Create-or-update driver that names commits and
//!   derives the public GitHub Pages URL
//! - [`site`] - One-off repository preparation (placeholder, landing page)
//!
//! Publishing is idempotent per path: when an object already exists its
//! current revision token is passed back as the update precondition, so
//! re-running a migration rewrites the same file instead of failing.

mod error;
mod github;
mod memory;
pub mod site;

pub use error::PublishError;
pub use github::{DEFAULT_API_BASE, GitHubStore};
pub use memory::{CommitRecord, MemoryStore};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

/// Directory inside the repository that receives migrated images.
pub const ASSET_DIR: &str = "images";

/// Default domain serving GitHub Pages sites.
pub const DEFAULT_PAGES_DOMAIN: &str = "github.io";

/// Opaque optimistic-concurrency token for a stored object (a blob SHA for
/// GitHub).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    /// Wraps a revision token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key-value content store that assets are written into.
///
/// Every successful `create` or `update` is one committed change in the
/// store's history.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Returns a short name for logs (e.g. `github:owner/repo@main`).
    fn describe(&self) -> String;

    /// Returns the current revision of `path`, or `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] when the store cannot be queried.
    async fn lookup(&self, path: &str) -> Result<Option<Revision>, PublishError>;

    /// Creates a new object at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Conflict`] when the path already exists, or
    /// another [`PublishError`] on transport/API failure.
    async fn create(&self, path: &str, message: &str, content: &[u8]) -> Result<(), PublishError>;

    /// Replaces the object at `path`, provided it is still at `revision`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Conflict`] when the revision is stale, or
    /// another [`PublishError`] on transport/API failure.
    async fn update(
        &self,
        path: &str,
        message: &str,
        content: &[u8],
        revision: &Revision,
    ) -> Result<(), PublishError>;
}

/// Whether a publish created a new object or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishAction {
    /// Object did not exist before.
    Created,
    /// Existing object was updated in place.
    Updated,
}

/// A successfully published asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedAsset {
    /// Path inside the repository (`images/<name>`).
    pub path: String,
    /// Public URL the asset is served from.
    pub public_url: String,
    /// Whether the object was created or updated.
    pub action: PublishAction,
}

/// Identity of the GitHub Pages site that serves the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagesSite {
    owner: String,
    repo: String,
    domain: String,
}

impl PagesSite {
    /// Creates a site identity for `https://{owner}.{domain}/{repo}/`.
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            domain: domain.into(),
        }
    }

    /// Returns the public URL for a repository path, escaping each segment.
    ///
    /// # Examples
    ///
    /// ```
    /// use migrator_core::publish::PagesSite;
    ///
    /// let site = PagesSite::new("acme", "product-images", "github.io");
    /// assert_eq!(
    ///     site.public_url("images/red shoe.jpg"),
    ///     "https://acme.github.io/product-images/images/red%20shoe.jpg"
    /// );
    /// ```
    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "https://{}.{}/{}/{}",
            self.owner,
            self.domain,
            self.repo,
            escape_path(path)
        )
    }
}

/// Percent-escapes every segment of a slash-separated path.
pub(crate) fn escape_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Drives create-or-update against an [`AssetStore`].
#[derive(Clone)]
pub struct AssetPublisher {
    store: Arc<dyn AssetStore>,
    site: PagesSite,
}

impl fmt::Debug for AssetPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetPublisher")
            .field("store", &self.store.describe())
            .field("site", &self.site)
            .finish()
    }
}

impl AssetPublisher {
    /// Creates a publisher writing into `store` and serving from `site`.
    pub fn new(store: Arc<dyn AssetStore>, site: PagesSite) -> Self {
        Self { store, site }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn AssetStore> {
        &self.store
    }

    /// Returns the site identity.
    #[must_use]
    pub fn site(&self) -> &PagesSite {
        &self.site
    }

    /// Returns the repository path an asset name is stored under.
    #[must_use]
    pub fn remote_path(name: &str) -> String {
        format!("{ASSET_DIR}/{name}")
    }

    /// Publishes `content` as `images/<name>`, creating or updating it.
    ///
    /// `batch` is the 1-based batch number, recorded in the commit message
    /// when known.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] when lookup, create, or update fails. The
    /// error is scoped to this asset only.
    #[instrument(skip(self, content), fields(bytes = content.len()))]
    pub async fn publish(
        &self,
        name: &str,
        content: &[u8],
        batch: Option<usize>,
    ) -> Result<PublishedAsset, PublishError> {
        let path = Self::remote_path(name);
        let message = commit_message(name, batch);

        match self.upsert(&path, &message, content).await {
            Ok(action) => {
                let public_url = self.site.public_url(&path);
                info!(path = %path, url = %public_url, ?action, "asset published");
                Ok(PublishedAsset {
                    path,
                    public_url,
                    action,
                })
            }
            Err(error) => {
                warn!(path = %path, error = %error, "publish failed");
                Err(error)
            }
        }
    }

    /// Creates `path`, or updates it against its current revision.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] from the underlying store.
    pub async fn upsert(
        &self,
        path: &str,
        message: &str,
        content: &[u8],
    ) -> Result<PublishAction, PublishError> {
        if let Some(revision) = self.store.lookup(path).await? {
            debug!(path, %revision, "object exists; updating");
            self.store.update(path, message, content, &revision).await?;
            Ok(PublishAction::Updated)
        } else {
            debug!(path, "object absent; creating");
            self.store.create(path, message, content).await?;
            Ok(PublishAction::Created)
        }
    }
}

fn commit_message(name: &str, batch: Option<usize>) -> String {
    match batch {
        Some(batch) => format!("Add image {name} [batch {batch}]"),
        None => format!("Add image {name}"),
    }
}

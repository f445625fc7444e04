//! Run configuration.
//!
//! Everything a migration needs is carried in an explicit [`MigratorConfig`]
//! handed to the pipeline at construction. The binary builds it from CLI
//! flags and environment variables; tests build it directly.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::download::FETCH_TIMEOUT_SECS;
use crate::migrate::BatchSettings;
use crate::publish::{DEFAULT_API_BASE, DEFAULT_PAGES_DOMAIN};
use crate::source::DEFAULT_SOURCE_HOST;
use crate::table::{DEFAULT_MAPPING_FILE, MappingFallback};

/// Default branch assets are committed to.
pub const DEFAULT_BRANCH: &str = "main";

/// Errors raised while assembling configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No API credential was supplied.
    #[error("missing GitHub token (pass --token or set GITHUB_TOKEN)")]
    MissingToken,

    /// No target repository was supplied.
    #[error("missing target repository (pass --repo owner/name or set GITHUB_REPO)")]
    MissingRepo,

    /// Repository identifier was not `owner/name`.
    #[error("invalid repository '{value}': expected owner/name")]
    InvalidRepo {
        /// The rejected value.
        value: String,
    },

    /// Batch size or worker count out of range.
    #[error("invalid setting {name}={value}: {reason}")]
    InvalidSetting {
        /// Setting name.
        name: &'static str,
        /// Rejected value.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

/// Target repository identity (`owner/name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    owner: String,
    name: String,
}

impl RepoId {
    /// Creates a repository identity from its parts.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Returns the owning user or organization.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the repository name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for RepoId {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidRepo {
            value: value.to_string(),
        };
        let (owner, name) = value.trim().split_once('/').ok_or_else(invalid)?;
        let valid_part = |part: &str| !part.is_empty() && !part.contains(['/', ' ']);
        if !valid_part(owner) || !valid_part(name) {
            return Err(invalid());
        }
        Ok(Self::new(owner, name))
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Complete configuration for one migration run.
#[derive(Clone)]
pub struct MigratorConfig {
    /// Repository receiving the images.
    pub repo: RepoId,
    /// Branch commits are written to (the Pages branch).
    pub branch: String,
    /// Bearer credential for the contents API.
    pub token: String,
    /// REST API root.
    pub api_base: String,
    /// Domain serving Pages sites (`github.io`).
    pub pages_domain: String,
    /// Host whose links are migrated.
    pub source_host: String,
    /// Batch size, worker count, and inter-batch pause.
    pub batch: BatchSettings,
    /// Total timeout for one source fetch.
    pub fetch_timeout: Duration,
    /// What to write for cells with no mapping.
    pub fallback: MappingFallback,
    /// Where the standalone mapping table is written.
    pub mapping_output: PathBuf,
    /// Prepare the repository (placeholder, landing page) before migrating.
    pub bootstrap: bool,
}

impl fmt::Debug for MigratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigratorConfig")
            .field("repo", &self.repo.to_string())
            .field("branch", &self.branch)
            .field("token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("pages_domain", &self.pages_domain)
            .field("source_host", &self.source_host)
            .field("batch", &self.batch)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("fallback", &self.fallback)
            .field("mapping_output", &self.mapping_output)
            .field("bootstrap", &self.bootstrap)
            .finish()
    }
}

impl MigratorConfig {
    /// Creates a configuration with defaults for everything but identity.
    pub fn new(repo: RepoId, token: impl Into<String>) -> Self {
        Self {
            repo,
            branch: DEFAULT_BRANCH.to_string(),
            token: token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            pages_domain: DEFAULT_PAGES_DOMAIN.to_string(),
            source_host: DEFAULT_SOURCE_HOST.to_string(),
            batch: BatchSettings::default(),
            fetch_timeout: Duration::from_secs(FETCH_TIMEOUT_SECS),
            fallback: MappingFallback::default(),
            mapping_output: PathBuf::from(DEFAULT_MAPPING_FILE),
            bootstrap: false,
        }
    }

    /// Checks ranges that the type system cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSetting`] for a zero batch size or a
    /// worker count outside the engine's supported range, and
    /// [`ConfigError::MissingToken`] for a blank token.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        self.batch.validate()
    }
}

//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use migrator_core::config::DEFAULT_BRANCH;
use migrator_core::migrate::{DEFAULT_BATCH_SIZE, DEFAULT_WORKERS};
use migrator_core::publish::{DEFAULT_API_BASE, DEFAULT_PAGES_DOMAIN};
use migrator_core::source::DEFAULT_SOURCE_HOST;
use migrator_core::table::DEFAULT_MAPPING_FILE;
use migrator_core::{ConfigError, MappingFallback, MigratorConfig, RepoId};

/// Move Dropbox-hosted product images into a GitHub Pages repository.
///
/// Reads a Shopify product CSV, uploads every Dropbox image it references,
/// and writes a copy of the CSV with the new GitHub Pages URLs alongside a
/// standalone mapping table.
#[derive(Parser, Debug)]
#[command(name = "dropbox-migrator")]
#[command(author, version, about)]
pub struct Args {
    /// Product CSV to migrate
    pub input: PathBuf,

    /// GitHub token with contents write access
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Target repository as owner/name
    #[arg(long, env = "GITHUB_REPO")]
    pub repo: Option<String>,

    /// Branch served by GitHub Pages
    #[arg(long, default_value = DEFAULT_BRANCH)]
    pub branch: String,

    /// Images per batch (1-500)
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE as u16, value_parser = clap::value_parser!(u16).range(1..=500))]
    pub batch_size: u16,

    /// Concurrent uploads within a batch (1-32)
    #[arg(short = 'w', long, default_value_t = DEFAULT_WORKERS as u8, value_parser = clap::value_parser!(u8).range(1..=32))]
    pub workers: u8,

    /// Seconds to wait between batches (0-3600)
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(0..=3600))]
    pub batch_pause_secs: u64,

    /// Timeout for each Dropbox download in seconds (1-600)
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..=600))]
    pub fetch_timeout_secs: u64,

    /// Copy the original URL into the GitHub columns when an image was not migrated
    #[arg(long)]
    pub keep_original: bool,

    /// Where to write the Dropbox-to-GitHub mapping CSV
    #[arg(long, default_value = DEFAULT_MAPPING_FILE)]
    pub mapping_output: PathBuf,

    /// Create the images directory placeholder and landing page first
    #[arg(long)]
    pub bootstrap: bool,

    /// List the images that would be migrated without touching the network
    #[arg(long)]
    pub dry_run: bool,

    /// GitHub REST API root
    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub api_url: String,

    /// Domain serving GitHub Pages sites
    #[arg(long, default_value = DEFAULT_PAGES_DOMAIN)]
    pub pages_domain: String,

    /// Host whose share links are migrated (subdomains included)
    #[arg(long, default_value = DEFAULT_SOURCE_HOST)]
    pub source_host: String,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Builds the run configuration for a live migration.
    pub fn to_config(&self) -> Result<MigratorConfig, ConfigError> {
        let token = self
            .token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;
        let repo: RepoId = self.repo.as_deref().ok_or(ConfigError::MissingRepo)?.parse()?;

        let mut config = MigratorConfig::new(repo, token);
        config.branch.clone_from(&self.branch);
        config.api_base.clone_from(&self.api_url);
        config.pages_domain.clone_from(&self.pages_domain);
        config.source_host.clone_from(&self.source_host);
        config.batch.batch_size = usize::from(self.batch_size);
        config.batch.workers = usize::from(self.workers);
        config.batch.batch_pause = Duration::from_secs(self.batch_pause_secs);
        config.fetch_timeout = Duration::from_secs(self.fetch_timeout_secs);
        config.fallback = if self.keep_original {
            MappingFallback::Original
        } else {
            MappingFallback::Empty
        };
        config.mapping_output.clone_from(&self.mapping_output);
        config.bootstrap = self.bootstrap;
        Ok(config)
    }
}

//! Dropbox migrator core library
//!
//! This library moves product images referenced by Dropbox share links in a
//! Shopify product-import spreadsheet into a GitHub Pages repository, and
//! rewrites the spreadsheet to point at the new stable URLs.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`source`] - Share-link recognition, direct-download rewriting, asset naming
//! - [`download`] - HTTP blob fetcher with a fixed timeout
//! - [`publish`] - Idempotent create-or-update against a content store
//! - [`migrate`] - Candidate collection and the batched fetch/publish engine
//! - [`table`] - CSV input/output and the mapping rewriter
//! - [`pipeline`] - End-to-end wiring from input file to output files
//! - [`config`] - Explicit run configuration

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod migrate;
pub mod pipeline;
pub mod publish;
pub mod source;
pub mod table;
mod user_agent;

// Re-export commonly used types
pub use config::{ConfigError, MigratorConfig, RepoId};
pub use download::{BlobFetcher, DownloadError, HttpClient};
pub use migrate::{
    CandidateSet, DEFAULT_BATCH_PAUSE, DEFAULT_BATCH_SIZE, DEFAULT_WORKERS, EngineError,
    MigrationEngine, MigrationReport, MigrationStats, UrlMapping, collect_candidates,
};
pub use pipeline::{MigrationOutcome, Pipeline, PipelineError, PlannedAsset, plan_migration};
pub use publish::{AssetPublisher, AssetStore, GitHubStore, MemoryStore, PublishError, PublishedAsset};
pub use source::{assign_asset_names, derive_asset_name, is_source_url, to_direct_download_url};
pub use table::{MappingFallback, Table, TableError};

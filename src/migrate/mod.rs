//! Batch orchestration: collect candidates, fetch and publish, map URLs.
//!
//! A run moves through three phases:
//!
//! 1. **Collect** - [`collect_candidates`] scans the image columns of the
//!    input table and keeps the distinct source-host URLs.
//! 2. **Process batches** - [`MigrationEngine::run`] splits the candidates
//!    into fixed-size batches; within a batch each URL is fetched and
//!    published by its own task, with a bounded number in flight. Batches
//!    are separated by a fixed pause.
//! 3. **Finalize** - the resulting [`UrlMapping`] is handed to the table
//!    rewriter.
//!
//! Per-URL failures never abort a batch; they are logged and reported in
//! [`MigrationReport::failures`].

mod engine;
mod mapping;

pub use engine::{
    AssetError, BatchSettings, DEFAULT_BATCH_PAUSE, DEFAULT_BATCH_SIZE, DEFAULT_WORKERS,
    EngineError, FailedAsset, MAX_WORKERS, MigrationEngine, MigrationReport, MigrationStats,
};
pub use mapping::UrlMapping;

use std::collections::HashSet;

use tracing::{debug, info, instrument};

use crate::source::{assign_asset_names, is_source_url};
use crate::table::{IMAGE_COLUMNS, Table};

/// Distinct source URLs to migrate, in deterministic scan order, each with
/// the asset name it publishes under.
///
/// Names are resolved over the whole set, so no two URLs share one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    urls: Vec<String>,
    names: Vec<String>,
}

impl CandidateSet {
    /// Builds a set from URLs, keeping the first occurrence of each.
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let urls = urls
            .into_iter()
            .map(Into::into)
            .filter(|url: &String| seen.insert(url.clone()))
            .collect::<Vec<_>>();
        let names = assign_asset_names(urls.iter().map(String::as_str));
        Self { urls, names }
    }

    /// Number of distinct URLs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Returns true when there is nothing to migrate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Returns the URLs in processing order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.urls
    }

    /// Iterates over the URLs in processing order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }

    /// Iterates over `(url, asset name)` pairs in processing order.
    pub fn named(&self) -> impl Iterator<Item = (&str, &str)> {
        self.urls
            .iter()
            .map(String::as_str)
            .zip(self.names.iter().map(String::as_str))
    }

    /// Asset name resolved for `url`, if it is a candidate.
    #[must_use]
    pub fn name_of(&self, url: &str) -> Option<&str> {
        self.named().find(|(candidate, _)| *candidate == url).map(|(_, name)| name)
    }

    /// Number of batches `batch_size` splits this set into.
    #[must_use]
    pub fn batch_count(&self, batch_size: usize) -> usize {
        self.urls.len().div_ceil(batch_size.max(1))
    }
}

/// Collects the distinct source-host URLs from the image columns.
///
/// All `Image Src` cells are scanned in row order, then all `Variant Image`
/// cells; the first occurrence of a URL fixes its position. Missing columns
/// contribute nothing.
#[instrument(skip(table), fields(rows = table.len()))]
pub fn collect_candidates(table: &Table, source_host: &str) -> CandidateSet {
    let mut values = Vec::new();
    for column in IMAGE_COLUMNS {
        match table.column(column) {
            Some(cells) => values.extend(cells.filter(|cell| is_source_url(cell, source_host))),
            None => debug!(column, "image column not present"),
        }
    }

    let candidates = CandidateSet::from_urls(values);
    info!(
        count = candidates.len(),
        source_host, "found unique source image URLs"
    );
    candidates
}

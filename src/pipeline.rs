//! End-to-end migration: input table in, augmented table and mapping out.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::{ConfigError, MigratorConfig};
use crate::download::BlobFetcher;
use crate::migrate::{
    EngineError, MigrationEngine, MigrationReport, MigrationStats, collect_candidates,
};
use crate::publish::{AssetPublisher, AssetStore, PagesSite, site};
use crate::source::rewrite_share_link;
use crate::table::{Table, TableError, augmented_output_path, mapping_table, rewrite};

/// Errors that stop a whole run.
///
/// Per-asset failures are not here: they end up in
/// [`MigrationReport::failures`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration was rejected before anything ran.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Input could not be read or an output could not be written.
    #[error(transparent)]
    Table(#[from] TableError),

    /// The engine itself failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// What a completed run produced.
#[derive(Debug)]
pub struct MigrationOutcome {
    /// Mapping and per-asset failures.
    pub report: MigrationReport,
    /// Number of distinct candidate URLs found in the input.
    pub candidates: usize,
    /// Where the augmented table was written.
    pub output_path: PathBuf,
    /// Where the mapping table was written.
    pub mapping_path: PathBuf,
}

/// Wires table IO, candidate collection, and the engine together.
#[derive(Debug)]
pub struct Pipeline {
    config: MigratorConfig,
    publisher: Arc<AssetPublisher>,
    engine: MigrationEngine,
}

impl Pipeline {
    /// Builds a pipeline over the given fetcher and store.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] when the configuration is invalid.
    pub fn new(
        config: MigratorConfig,
        fetcher: Arc<dyn BlobFetcher>,
        store: Arc<dyn AssetStore>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let site = PagesSite::new(config.repo.owner(), config.repo.name(), &config.pages_domain);
        let publisher = Arc::new(AssetPublisher::new(store, site));
        let engine = MigrationEngine::new(config.batch, fetcher, Arc::clone(&publisher))?;
        Ok(Self {
            config,
            publisher,
            engine,
        })
    }

    /// Returns the live counters of the underlying engine.
    #[must_use]
    pub fn stats(&self) -> Arc<MigrationStats> {
        self.engine.stats()
    }

    /// Runs a full migration of `input`.
    ///
    /// Both output tables are written even when no candidate was found or
    /// every asset failed.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when the input cannot be read, an output
    /// cannot be written, or the engine fails.
    #[instrument(skip(self), fields(input = %input.display()))]
    pub async fn run(&self, input: &Path) -> Result<MigrationOutcome, PipelineError> {
        let table = Table::read_path(input)?;
        let candidates = collect_candidates(&table, &self.config.source_host);

        if self.config.bootstrap {
            self.bootstrap().await;
        }

        let report = self.engine.run(&candidates).await?;

        let output_path = augmented_output_path(input);
        rewrite(&table, &report.mapping, self.config.fallback).write_path(&output_path)?;

        let mapping_path = self.config.mapping_output.clone();
        mapping_table(&report.mapping).write_path(&mapping_path)?;

        info!(
            output = %output_path.display(),
            mapping = %mapping_path.display(),
            mapped = report.succeeded(),
            failed = report.failed(),
            "outputs written"
        );

        Ok(MigrationOutcome {
            report,
            candidates: candidates.len(),
            output_path,
            mapping_path,
        })
    }

    // Bootstrap problems are logged and the migration continues: the asset
    // uploads report their own failures if the store is really unusable.
    async fn bootstrap(&self) {
        if let Err(error) = site::ensure_asset_directory(&self.publisher).await {
            warn!(error = %error, "could not create asset directory placeholder");
        }
        if let Err(error) = site::publish_landing_page(&self.publisher).await {
            warn!(error = %error, "could not publish landing page");
        }
    }
}

/// One candidate as a dry run would migrate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAsset {
    /// URL as it appears in the table.
    pub url: String,
    /// URL that would be fetched.
    pub direct_url: String,
    /// Repository path the asset would be written to.
    pub remote_path: String,
}

/// Lists what a migration of `table` would do, without any network access.
#[must_use]
pub fn plan_migration(table: &Table, source_host: &str) -> Vec<PlannedAsset> {
    collect_candidates(table, source_host)
        .named()
        .map(|(url, name)| PlannedAsset {
            url: url.to_string(),
            direct_url: rewrite_share_link(url, source_host),
            remote_path: AssetPublisher::remote_path(name),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::time::Duration;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use crate::config::RepoId;
    use crate::download::DownloadError;
    use crate::publish::MemoryStore;
    use crate::table::{IMAGE_SRC_COLUMN, MAPPED_IMAGE_COLUMN, MAPPED_VARIANT_COLUMN};

    const PHOTO: &str = "https://www.dropbox.com/s/abc/photo.jpg?dl=0";

    struct MapFetcher(HashMap<String, Vec<u8>>);

    #[async_trait]
    impl BlobFetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| DownloadError::http_status(url, 404))
        }
    }

    fn config(dir: &Path) -> MigratorConfig {
        let mut config = MigratorConfig::new(RepoId::new("acme", "imgs"), "token");
        config.batch.batch_pause = Duration::ZERO;
        config.mapping_output = dir.join("mapping.csv");
        config
    }

    fn write_input(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("products.csv");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[tokio::test]
    async fn test_run_writes_both_outputs() {
        let temp = TempDir::new().unwrap();
        let input = write_input(
            temp.path(),
            &format!("Handle,Image Src,Variant Image\nshoe,{PHOTO},\n"),
        );
        let fetcher = MapFetcher(HashMap::from([(PHOTO.to_string(), b"jpeg".to_vec())]));
        let store = Arc::new(MemoryStore::new());
        let pipeline =
            Pipeline::new(config(temp.path()), Arc::new(fetcher), store.clone())
                .unwrap();

        let outcome = pipeline.run(&input).await.unwrap();

        assert_eq!(outcome.candidates, 1);
        assert_eq!(outcome.output_path, temp.path().join("products_with_github_urls.csv"));
        let output = Table::read_path(&outcome.output_path).unwrap();
        assert_eq!(
            output.cell(0, MAPPED_IMAGE_COLUMN),
            Some("https://acme.github.io/imgs/images/photo.jpg")
        );
        assert_eq!(output.cell(0, MAPPED_VARIANT_COLUMN), Some(""));

        let mapping = Table::read_path(&outcome.mapping_path).unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(
            mapping.rows()[0],
            vec![PHOTO, "https://acme.github.io/imgs/images/photo.jpg"]
        );
        assert_eq!(store.paths(), vec!["images/photo.jpg"]);
        assert_eq!(pipeline.stats().succeeded(), 1);
    }

    #[tokio::test]
    async fn test_run_without_candidates_still_writes_outputs() {
        let temp = TempDir::new().unwrap();
        let input = write_input(temp.path(), "Handle,Title\nshoe,Shoe\n");
        let pipeline = Pipeline::new(
            config(temp.path()),
            Arc::new(MapFetcher(HashMap::new())),
            Arc::new(MemoryStore::new()),
        )
        .unwrap();

        let outcome = pipeline.run(&input).await.unwrap();
        assert_eq!(outcome.candidates, 0);
        assert_eq!(outcome.report.batches, 0);
        assert!(outcome.output_path.exists());
        assert!(Table::read_path(&outcome.mapping_path).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bootstrap_prepares_store_before_assets() {
        let temp = TempDir::new().unwrap();
        let input = write_input(temp.path(), &format!("Image Src\n{PHOTO}\n"));
        let mut config = config(temp.path());
        config.bootstrap = true;
        let store = Arc::new(MemoryStore::new());
        let fetcher = MapFetcher(HashMap::from([(PHOTO.to_string(), b"x".to_vec())]));
        let pipeline = Pipeline::new(config, Arc::new(fetcher), store.clone()).unwrap();

        pipeline.run(&input).await.unwrap();
        assert_eq!(
            store.paths(),
            vec!["images/.gitkeep", "images/photo.jpg", "index.html"]
        );
    }

    #[tokio::test]
    async fn test_run_missing_input_is_table_error() {
        let temp = TempDir::new().unwrap();
        let pipeline = Pipeline::new(
            config(temp.path()),
            Arc::new(MapFetcher(HashMap::new())),
            Arc::new(MemoryStore::new()),
        )
        .unwrap();
        let result = pipeline.run(&temp.path().join("missing.csv")).await;
        assert!(matches!(result, Err(PipelineError::Table(TableError::Io { .. }))));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = MigratorConfig::new(RepoId::new("acme", "imgs"), "token");
        config.batch.workers = 0;
        let result = Pipeline::new(
            config,
            Arc::new(MapFetcher(HashMap::new())),
            Arc::new(MemoryStore::new()),
        );
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_plan_migration_lists_direct_urls_and_paths() {
        let mut table = Table::new([IMAGE_SRC_COLUMN]);
        table.push_row([PHOTO]);
        table.push_row([PHOTO]);
        table.push_row(["https://cdn.shopify.com/x.jpg"]);

        let plan = plan_migration(&table, "dropbox.com");
        assert_eq!(
            plan,
            vec![PlannedAsset {
                url: PHOTO.to_string(),
                direct_url: "https://www.dropbox.com/s/abc/photo.jpg?dl=1".to_string(),
                remote_path: "images/photo.jpg".to_string(),
            }]
        );
    }

    #[test]
    fn test_plan_migration_gives_shared_basenames_distinct_paths() {
        let other = "https://www.dropbox.com/s/def/photo.jpg?dl=0";
        let mut table = Table::new([IMAGE_SRC_COLUMN]);
        table.push_row([PHOTO]);
        table.push_row([other]);

        let plan = plan_migration(&table, "dropbox.com");
        assert_eq!(plan.len(), 2);
        assert_ne!(plan[0].remote_path, plan[1].remote_path);
        for asset in &plan {
            assert!(asset.remote_path.starts_with("images/"));
            assert!(asset.remote_path.ends_with(".jpg"));
            assert_ne!(asset.remote_path, "images/photo.jpg");
        }
    }
}

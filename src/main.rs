//! CLI entry point for the Dropbox migrator.

use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use clap::Parser;
use migrator_core::{GitHubStore, HttpClient, Pipeline, Table, plan_migration};
use tracing::{debug, info, warn};

mod cli;
mod progress;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(input = %args.input.display(), dry_run = args.dry_run, "CLI arguments parsed");
    info!("Dropbox migrator starting");

    if args.dry_run {
        return run_dry_run(&args);
    }

    let config = args.to_config()?;
    info!(
        repo = %config.repo,
        branch = %config.branch,
        batch_size = config.batch.batch_size,
        workers = config.batch.workers,
        "Publishing to GitHub Pages repository"
    );

    let fetcher = HttpClient::with_timeout(config.fetch_timeout)?
        .with_source_host(config.source_host.clone());
    let store = GitHubStore::new(
        &config.api_base,
        config.repo.clone(),
        config.branch.clone(),
        config.token.clone(),
    )?;
    let pipeline = Pipeline::new(config, Arc::new(fetcher), Arc::new(store))?;

    let use_spinner = !args.quiet && io::stderr().is_terminal();
    let (spinner, stop) = progress::spawn_progress_ui(use_spinner, pipeline.stats());
    let result = pipeline.run(&args.input).await;
    stop.store(true, Ordering::SeqCst);
    if let Some(handle) = spinner {
        let _ = handle.await;
    }

    let outcome =
        result.with_context(|| format!("migration of {} failed", args.input.display()))?;
    let report = &outcome.report;

    if report.failed() > 0 {
        warn!(
            failed = report.failed(),
            "Some images were not migrated; their GitHub columns are left unmapped"
        );
    }
    info!(
        candidates = outcome.candidates,
        migrated = report.succeeded(),
        failed = report.failed(),
        created = report.created,
        updated = report.updated,
        batches = report.batches,
        "Migration complete"
    );

    if !args.quiet {
        println!(
            "Migrated {}/{} image(s).",
            report.succeeded(),
            outcome.candidates
        );
        println!("Updated table: {}", outcome.output_path.display());
        println!("URL mapping:   {}", outcome.mapping_path.display());
    }

    Ok(())
}

fn run_dry_run(args: &Args) -> Result<()> {
    let table = Table::read_path(&args.input)?;
    let plan = plan_migration(&table, &args.source_host);
    info!(rows = table.len(), candidates = plan.len(), "Scanned input (dry run)");

    println!(
        "Dry run preview: {} row(s), {} unique Dropbox image(s).",
        table.len(),
        plan.len()
    );
    for asset in &plan {
        println!("- {} -> {}", asset.direct_url, asset.remote_path);
    }
    println!("Dry run - nothing fetched or published");
    Ok(())
}

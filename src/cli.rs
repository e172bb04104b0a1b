//! Command-line surface for extension-mirror.
//!
//! This module is CLI glue only: it parses flags, merges them into a
//! [`MirrorConfig`], wires the real collaborators (reqwest, the git binary)
//! into a [`SyncEngine`] and prints the run report. All sync logic lives in
//! [`crate::synchronise`].
//!
//! Per-entry failures are part of the report and do not fail the command;
//! only setup failures (config, data directories, catalog) do.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::catalog::HttpCatalog;
use crate::config::MirrorConfig;
use crate::download::{DefaultFetcher, SystemGit};
use crate::http::ReqwestHttpClient;
use crate::layout::DataLayout;
use crate::load_config::resolve_config;
use crate::normalize::ContentRootLocator;
use crate::synchronise::{SyncEngine, SyncReport};

/// Download all known wiki extensions.
#[derive(Debug, Parser)]
#[clap(
    name = "extension-mirror",
    version,
    about = "Download all known wiki extensions and keep them up to date"
)]
pub struct Cli {
    /// Where to store downloaded data
    #[clap(short = 'd', long = "datadir", value_name = "DIRECTORY")]
    pub datadir: Option<PathBuf>,

    /// Should the wiki core be downloaded as well?
    #[clap(short = 'w', long)]
    pub dokuwiki: bool,

    /// Prefer git checkouts? Takes longer and results in more data
    #[clap(short = 'g', long)]
    pub git: bool,

    /// Optional YAML config file
    #[clap(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Defaults, then the config file, then the environment, then flags.
    pub fn to_config(&self) -> Result<MirrorConfig> {
        let mut config = resolve_config(self.config.as_deref())?;
        if let Some(datadir) = &self.datadir {
            config.data_root = datadir.clone();
        }
        if self.dokuwiki {
            config.include_core_mirror = true;
        }
        if self.git {
            config.prefer_git_checkout = true;
        }
        Ok(config)
    }
}

/// Entrypoint shared by `main` and the integration tests.
pub async fn run(cli: Cli) -> Result<SyncReport> {
    tracing::info!("trace_initialised");

    let config = cli.to_config()?;
    config.trace_loaded();

    let http = ReqwestHttpClient::new()?;
    let catalog = HttpCatalog::new(http.clone(), config.catalog_url.clone());
    let fetcher = DefaultFetcher::new(
        DataLayout::new(&config.data_root),
        http,
        SystemGit,
        ContentRootLocator::new(config.content_marker.clone()),
    );
    let engine = SyncEngine::new(&config, catalog, fetcher);

    println!("Synchronise starting...");
    match engine.run().await {
        Ok(report) => {
            print_report(&report);
            Ok(report)
        }
        Err(e) => {
            eprintln!("[ERROR] Synchronisation failed: {}", e);
            Err(e.into())
        }
    }
}

fn print_report(report: &SyncReport) {
    println!("Synchronise complete.");
    println!(
        "{} catalog entries, {} unchanged, {} synced, {} failed, {} rejected",
        report.catalog_entries,
        report.unchanged,
        report.synced.len(),
        report.failed.len(),
        report.rejected.len()
    );
    for entry in &report.synced {
        println!("  synced  {} {} ({})", entry.full_name, entry.version, entry.strategy);
    }
    for failure in report.failed.iter().chain(&report.rejected) {
        println!("  failed  {}: {}", failure.key, failure.message);
    }
}

//! Coordinating module for the catalog → fetch → record pipeline.
//!
//! One run:
//! 1. create the data directories and drop the previous error log;
//! 2. query the catalog (fatal on failure);
//! 3. build the work list, rejecting unusable entries and skipping those
//!    whose marker already matches;
//! 4. process tasks one at a time, trying each planned strategy in order;
//! 5. write the marker only after a strategy has fully succeeded.
//!
//! A task's failure is logged and recorded in the report; it never stops
//! the run.

use tracing::{error, info, info_span, warn, Instrument};

use crate::catalog::CatalogEntry;
use crate::config::{CoreMirror, MirrorConfig};
use crate::contract::{CatalogSource, Fetcher};
use crate::error::{FetchError, RejectReason, SyncError};
use crate::error_log::ErrorLog;
use crate::layout::DataLayout;
use crate::repo_url::normalize_repo_url;
use crate::version_store::VersionStore;

/// The resolved unit of work for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTask {
    pub full_name: String,
    pub acquisition_url: String,
    pub repo_url: Option<String>,
    pub target_version: String,
}

impl SyncTask {
    pub fn core(core: &CoreMirror) -> Self {
        Self {
            full_name: core.name.clone(),
            acquisition_url: core.archive_url.clone(),
            repo_url: Some(core.repo_url.clone()),
            target_version: core.version.clone(),
        }
    }
}

/// One way of acquiring a task's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    Checkout { repo_url: String },
    Archive { url: String },
}

impl Strategy {
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Checkout { .. } => "checkout",
            Strategy::Archive { .. } => "archive",
        }
    }
}

/// Ordered strategies for one task. Failures in `preferred` are soft and
/// move on to the next strategy; the `fallback` failing fails the task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub preferred: Vec<Strategy>,
    pub fallback: Strategy,
}

impl Plan {
    pub fn strategies(&self) -> impl Iterator<Item = &Strategy> {
        self.preferred.iter().chain(std::iter::once(&self.fallback))
    }
}

/// Result of filtering the catalog against the version markers.
#[derive(Debug, Default)]
pub struct WorkList {
    pub tasks: Vec<SyncTask>,
    pub rejected: Vec<RejectReason>,
    pub unchanged: usize,
}

fn is_usable_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

pub fn build_work_list(entries: Vec<CatalogEntry>, versions: &VersionStore) -> WorkList {
    let mut work = WorkList::default();
    for entry in entries {
        let Some(kind) = entry.extension_kind() else {
            work.rejected.push(RejectReason::UnsupportedKind {
                raw_key: entry.raw_key,
                kind: entry.kind,
            });
            continue;
        };
        if !is_usable_name(&entry.name) {
            work.rejected.push(RejectReason::InvalidName {
                raw_key: entry.raw_key,
                name: entry.name,
            });
            continue;
        }
        let full_name = kind.full_name(&entry.name);

        let Some(acquisition_url) = entry.download_url else {
            work.rejected
                .push(RejectReason::MissingDownloadUrl { full_name });
            continue;
        };

        if !versions.has_changed(&full_name, &entry.version) {
            work.unchanged += 1;
            continue;
        }

        work.tasks.push(SyncTask {
            full_name,
            acquisition_url,
            repo_url: entry.source_repo.as_deref().and_then(normalize_repo_url),
            target_version: entry.version,
        });
    }
    work
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedEntry {
    pub full_name: String,
    pub version: String,
    pub strategy: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub key: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub catalog_entries: usize,
    pub unchanged: usize,
    pub rejected: Vec<TaskFailure>,
    pub synced: Vec<SyncedEntry>,
    pub failed: Vec<TaskFailure>,
}

pub struct SyncEngine<C, F> {
    layout: DataLayout,
    versions: VersionStore,
    error_log: ErrorLog,
    catalog: C,
    fetcher: F,
    prefer_git_checkout: bool,
    core: Option<CoreMirror>,
}

impl<C: CatalogSource, F: Fetcher> SyncEngine<C, F> {
    pub fn new(config: &MirrorConfig, catalog: C, fetcher: F) -> Self {
        let layout = DataLayout::new(&config.data_root);
        Self {
            versions: VersionStore::new(layout.clone()),
            error_log: ErrorLog::new(layout.error_log_path()),
            layout,
            catalog,
            fetcher,
            prefer_git_checkout: config.prefer_git_checkout,
            core: config
                .include_core_mirror
                .then(|| config.core.clone()),
        }
    }

    /// Strategies for a task: an optional checkout first, the archive last.
    pub fn plan(&self, task: &SyncTask) -> Plan {
        let mut preferred = Vec::new();
        if self.prefer_git_checkout {
            if let Some(repo_url) = &task.repo_url {
                preferred.push(Strategy::Checkout {
                    repo_url: repo_url.clone(),
                });
            }
        }
        Plan {
            preferred,
            fallback: Strategy::Archive {
                url: task.acquisition_url.clone(),
            },
        }
    }

    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        self.layout.prepare()?;
        self.error_log
            .truncate()
            .map_err(|source| SyncError::Setup {
                path: self.error_log.path().to_path_buf(),
                source,
            })?;

        let entries = self.catalog.fetch_catalog().await.map_err(|e| {
            error!(error = %e, "Failed to fetch catalog");
            e
        })?;

        let mut report = SyncReport {
            catalog_entries: entries.len(),
            ..SyncReport::default()
        };

        let work = build_work_list(entries, &self.versions);
        for reason in &work.rejected {
            error!(key = reason.log_key(), reason = %reason, "Rejected catalog entry");
            self.log_failure(reason.log_key(), &reason.to_string());
            report.rejected.push(TaskFailure {
                key: reason.log_key().to_string(),
                message: reason.to_string(),
            });
        }
        report.unchanged = work.unchanged;

        let mut tasks = work.tasks;
        if let Some(core) = &self.core {
            tasks.push(SyncTask::core(core));
        }
        info!(count = tasks.len(), "{} extensions need updating", tasks.len());

        for task in &tasks {
            let span = info_span!("task", full_name = %task.full_name);
            match self.process(task).instrument(span).await {
                Ok(strategy) => report.synced.push(SyncedEntry {
                    full_name: task.full_name.clone(),
                    version: task.target_version.clone(),
                    strategy: strategy.label(),
                }),
                Err(e) => {
                    error!(full_name = %task.full_name, error = %e, "Failed to sync entry");
                    self.log_failure(&task.full_name, &e.to_string());
                    report.failed.push(TaskFailure {
                        key: task.full_name.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            synced = report.synced.len(),
            failed = report.failed.len(),
            rejected = report.rejected.len(),
            unchanged = report.unchanged,
            "Sync run finished"
        );
        Ok(report)
    }

    /// Acquire the content, then record the marker.
    async fn process(&self, task: &SyncTask) -> Result<Strategy, FetchError> {
        info!(full_name = %task.full_name, "Fetching {}...", task.full_name);
        let strategy = self.acquire(task).await?;
        self.versions
            .record(&task.full_name, &task.target_version)
            .map_err(|e| FetchError::io(self.layout.marker_path(&task.full_name), e))?;
        info!(
            full_name = %task.full_name,
            version = %task.target_version,
            strategy = strategy.label(),
            "Synced entry"
        );
        Ok(strategy)
    }

    async fn acquire(&self, task: &SyncTask) -> Result<Strategy, FetchError> {
        let plan = self.plan(task);
        for strategy in plan.preferred {
            match self.attempt(task, &strategy).await {
                Ok(()) => return Ok(strategy),
                Err(e) => warn!(
                    full_name = %task.full_name,
                    strategy = strategy.label(),
                    error = %e,
                    "Strategy failed, falling back"
                ),
            }
        }
        self.attempt(task, &plan.fallback).await?;
        Ok(plan.fallback)
    }

    async fn attempt(&self, task: &SyncTask, strategy: &Strategy) -> Result<(), FetchError> {
        match strategy {
            Strategy::Checkout { repo_url } => {
                self.fetcher
                    .checkout(&task.full_name, repo_url, &task.target_version)
                    .await
            }
            Strategy::Archive { url } => {
                self.fetcher
                    .download_and_install(&task.full_name, url, &task.target_version)
                    .await
            }
        }
    }

    fn log_failure(&self, key: &str, message: &str) {
        if let Err(e) = self.error_log.append(key, message) {
            warn!(error = %e, path = %self.error_log.path().display(), "Could not write error log");
        }
    }
}

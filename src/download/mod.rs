//! Content acquisition for a single entry.
//!
//! [`DefaultFetcher`] implements both strategies behind the
//! [`Fetcher`](crate::contract::Fetcher) trait:
//! - archive: download, sniff, extract, normalize, swap into `src/<full_name>`
//!   (see [`archive`]);
//! - checkout: clone or update a git working copy (see [`git`]).
//!
//! Both replace the target wholesale and clean their scratch paths on every
//! exit path. Neither writes the version marker.

pub mod archive;
pub mod git;
mod scratch;

use async_trait::async_trait;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::contract::{Fetcher, GitClient, HttpClient};
use crate::error::FetchError;
use crate::layout::DataLayout;
use crate::normalize::ContentRootLocator;

pub use archive::MIN_ARCHIVE_BYTES;
pub use git::SystemGit;

pub struct DefaultFetcher<H, G> {
    layout: DataLayout,
    http: H,
    git: G,
    locator: ContentRootLocator,
}

impl<H: HttpClient, G: GitClient> DefaultFetcher<H, G> {
    pub fn new(layout: DataLayout, http: H, git: G, locator: ContentRootLocator) -> Self {
        Self {
            layout,
            http,
            git,
            locator,
        }
    }
}

#[async_trait]
impl<H: HttpClient, G: GitClient> Fetcher for DefaultFetcher<H, G> {
    async fn download_and_install(
        &self,
        full_name: &str,
        url: &str,
        version: &str,
    ) -> Result<(), FetchError> {
        self.install_archive(full_name, url, version).await
    }

    async fn checkout(
        &self,
        full_name: &str,
        repo_url: &str,
        version: &str,
    ) -> Result<(), FetchError> {
        self.checkout_repo(full_name, repo_url, version)
    }
}

/// Remove `target` if present, then move `source` into its place.
pub(crate) fn replace_dir(source: &Path, target: &Path) -> Result<(), FetchError> {
    scratch::remove_path(target).map_err(|e| FetchError::io(target, e))?;
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| FetchError::io(parent, e))?;
    }
    fs::rename(source, target).map_err(|e| FetchError::io(target, e))?;
    debug!(from = %source.display(), to = %target.display(), "Moved content into place");
    Ok(())
}

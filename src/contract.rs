//! # contract: seams between the sync engine and the outside world
//!
//! The engine talks to the network, to git and to the catalog only through
//! the traits in this module, so each collaborator can be swapped for a
//! `mockall` mock in tests.
//!
//! - [`HttpClient`]: fetch one URL, return status and body.
//! - [`GitClient`]: run one git command.
//! - [`CatalogSource`]: list the catalog entries.
//! - [`Fetcher`]: acquire one entry's content with a given strategy.
//!
//! Mocks are exported when the `test-export-mocks` feature is on (default),
//! so integration tests under `tests/` can use them as well.

use async_trait::async_trait;
use std::io;
use std::path::PathBuf;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::catalog::CatalogEntry;
use crate::error::{CatalogFetchError, FetchError};

/// Status and full body of a finished GET.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// The request never produced a response (DNS, TLS, connection reset...).
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Fetch-by-URL primitive. Redirects are followed by the implementor.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// Exit of one git command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitOutcome {
    pub success: bool,
    /// Human-readable exit status, used in error messages.
    pub status: String,
}

impl GitOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            status: "exit status: 0".into(),
        }
    }

    pub fn failed(status: impl Into<String>) -> Self {
        Self {
            success: false,
            status: status.into(),
        }
    }
}

/// Runs `git <args>`, optionally inside `cwd`. Must never prompt.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait GitClient: Send + Sync {
    fn run(&self, cwd: Option<PathBuf>, args: Vec<String>) -> io::Result<GitOutcome>;
}

/// The remote catalog, most recently updated entries first.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, CatalogFetchError>;
}

/// Acquires one entry's content into `src/<full_name>`.
///
/// Neither method writes the version marker; the caller does that once the
/// method has returned `Ok`.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Download an archive, extract it and swap it into place.
    async fn download_and_install(
        &self,
        full_name: &str,
        url: &str,
        version: &str,
    ) -> Result<(), FetchError>;

    /// Clone or update a git working copy at the target.
    async fn checkout(
        &self,
        full_name: &str,
        repo_url: &str,
        version: &str,
    ) -> Result<(), FetchError>;
}

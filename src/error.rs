//! Error types for the mirror.
//!
//! Three families, matching where an error may surface:
//! - [`SyncError`] is fatal and aborts the run (setup, catalog).
//! - [`FetchError`] belongs to a single task and never crosses the task boundary.
//! - [`RejectReason`] is produced while building the work list; rejected
//!   entries are logged and never dispatched.

use std::fmt;
use std::path::PathBuf;

/// Fatal errors: the run cannot continue.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("could not prepare {}: {source}", .path.display())]
    Setup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    CatalogFetch(#[from] CatalogFetchError),
}

/// The catalog could not be retrieved or decoded.
#[derive(Debug, thiserror::Error)]
pub enum CatalogFetchError {
    #[error("catalog request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("catalog request to {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("catalog payload could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Why a response body was refused as an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadResponseReason {
    Status(u16),
    TooShort(usize),
}

impl fmt::Display for BadResponseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BadResponseReason::Status(code) => write!(f, "Download failed. Status {code}"),
            BadResponseReason::TooShort(len) => {
                write!(f, "Download not an archive ({len} bytes)")
            }
        }
    }
}

/// One git invocation in the checkout sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitStep {
    Clone,
    SetUrl,
    Fetch,
    Reset,
    Clean,
}

impl fmt::Display for GitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GitStep::Clone => "clone",
            GitStep::SetUrl => "remote set-url",
            GitStep::Fetch => "fetch",
            GitStep::Reset => "reset",
            GitStep::Clean => "clean",
        };
        f.write_str(name)
    }
}

/// Per-task acquisition failures.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("download of {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("{reason} ({url})")]
    BadResponse {
        url: String,
        reason: BadResponseReason,
    },
    #[error("git {step} failed: {detail}")]
    Checkout { step: GitStep, detail: String },
    #[error("could not extract archive: {message}")]
    Extract { message: String },
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FetchError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<zip::result::ZipError> for FetchError {
    fn from(e: zip::result::ZipError) -> Self {
        FetchError::Extract {
            message: e.to_string(),
        }
    }
}

/// Why a catalog entry was left out of the work list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("Unknown type {kind}")]
    UnsupportedKind { raw_key: String, kind: String },
    #[error("no download URL")]
    MissingDownloadUrl { full_name: String },
    #[error("name {name:?} cannot be used as a directory name")]
    InvalidName { raw_key: String, name: String },
}

impl RejectReason {
    /// The key the rejection is logged under.
    pub fn log_key(&self) -> &str {
        match self {
            RejectReason::UnsupportedKind { raw_key, .. } => raw_key,
            RejectReason::InvalidName { raw_key, .. } => raw_key,
            RejectReason::MissingDownloadUrl { full_name } => full_name,
        }
    }
}

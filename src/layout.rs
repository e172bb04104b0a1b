use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::catalog::ExtensionKind;
use crate::error::SyncError;

/// Paths under the data root. Every component takes one of these instead of
/// building paths on its own.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta_dir(&self) -> PathBuf {
        self.root.join("meta")
    }

    pub fn src_dir(&self) -> PathBuf {
        self.root.join("src")
    }

    pub fn marker_path(&self, full_name: &str) -> PathBuf {
        self.meta_dir().join(format!("{full_name}.last"))
    }

    pub fn target_dir(&self, full_name: &str) -> PathBuf {
        self.src_dir().join(full_name)
    }

    pub fn scratch_dir(&self, full_name: &str) -> PathBuf {
        self.meta_dir().join(format!("{full_name}.tmp"))
    }

    pub fn scratch_archive(&self, full_name: &str) -> PathBuf {
        self.meta_dir().join(format!("{full_name}.archive"))
    }

    pub fn error_log_path(&self) -> PathBuf {
        self.meta_dir().join("error.log")
    }

    /// Create `meta/<kind>` and `src/<kind>` for every supported kind.
    pub fn prepare(&self) -> Result<(), SyncError> {
        for kind in ExtensionKind::ALL {
            for base in [self.meta_dir(), self.src_dir()] {
                let dir = base.join(kind.as_str());
                fs::create_dir_all(&dir).map_err(|source| SyncError::Setup {
                    path: dir.clone(),
                    source,
                })?;
                debug!(path = %dir.display(), "Ensured data directory");
            }
        }
        Ok(())
    }
}

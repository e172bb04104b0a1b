use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Scratch paths owned by one fetch. Leftovers from an earlier crashed run
/// are removed on claim; everything is removed again on drop.
pub(crate) struct Scratch {
    paths: Vec<PathBuf>,
}

impl Scratch {
    pub(crate) fn claim(paths: Vec<PathBuf>) -> io::Result<Self> {
        for path in &paths {
            remove_path(path)?;
        }
        Ok(Self { paths })
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        for path in &self.paths {
            if let Err(e) = remove_path(path) {
                warn!(error = %e, path = %path.display(), "Failed to remove scratch path");
            }
        }
    }
}

/// Remove a file or directory tree; a missing path is not an error.
pub(crate) fn remove_path(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

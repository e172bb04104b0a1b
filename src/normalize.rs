//! Locate the real content root inside an extracted archive.
//!
//! Upstream archives either hold the extension files at their root or wrap
//! them in one directory (GitHub's `repo-branch/`). Descending through single
//! wrappers makes both layouts land the same way on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory names produced by archive tooling rather than by the extension.
pub const HOST_ARTIFACTS: &[&str] = &["pax_global_header"];

#[derive(Debug, Clone)]
pub struct ContentRootLocator {
    marker_extension: String,
}

impl Default for ContentRootLocator {
    fn default() -> Self {
        Self::new("php")
    }
}

impl ContentRootLocator {
    pub fn new(marker_extension: impl Into<String>) -> Self {
        Self {
            marker_extension: marker_extension.into(),
        }
    }

    pub fn locate_content_root(&self, dir: PathBuf) -> io::Result<PathBuf> {
        let mut has_marker = false;
        let mut subdirs = Vec::new();

        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let path = entry.path();
            if file_type.is_file() && self.is_marker(&path) {
                has_marker = true;
                break;
            }
            if file_type.is_dir() && !is_noise(&entry.file_name().to_string_lossy()) {
                subdirs.push(path);
            }
        }

        if !has_marker && subdirs.len() == 1 {
            let next = subdirs.remove(0);
            debug!(from = %dir.display(), to = %next.display(), "Descending into wrapper directory");
            return self.locate_content_root(next);
        }
        Ok(dir)
    }

    fn is_marker(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext == self.marker_extension.as_str())
            .unwrap_or(false)
    }
}

// Hidden directories never count, the same way a shell glob skips them.
fn is_noise(name: &str) -> bool {
    name.starts_with('.') || HOST_ARTIFACTS.contains(&name)
}

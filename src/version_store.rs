//! Per-entry version markers.
//!
//! One file per entry at `meta/<full_name>.last`, holding the version string
//! of the last successful sync. Comparison is exact string equality: a
//! catalog that reformats the same version will trigger a re-download.

use std::fs;
use std::io;
use tracing::debug;

use crate::layout::DataLayout;

#[derive(Debug, Clone)]
pub struct VersionStore {
    layout: DataLayout,
}

impl VersionStore {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }

    /// The stored marker, trimmed, or `None` if no marker is readable.
    pub fn read(&self, full_name: &str) -> Option<String> {
        let path = self.layout.marker_path(full_name);
        fs::read_to_string(&path)
            .ok()
            .map(|content| content.trim().to_string())
    }

    pub fn has_changed(&self, full_name: &str, candidate: &str) -> bool {
        match self.read(full_name) {
            Some(last) => last != candidate,
            None => true,
        }
    }

    /// Overwrite the marker. Only call once the content swap has committed.
    pub fn record(&self, full_name: &str, version: &str) -> io::Result<()> {
        let path = self.layout.marker_path(full_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, version)?;
        debug!(full_name, version, path = %path.display(), "Recorded version marker");
        Ok(())
    }
}

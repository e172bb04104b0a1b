use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::catalog::DEFAULT_CATALOG_URL;

/// Everything a run needs, built by the CLI and threaded into the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MirrorConfig {
    pub data_root: PathBuf,
    /// Also mirror the wiki core at its floating branch.
    pub include_core_mirror: bool,
    /// Try a git checkout before falling back to the archive.
    pub prefer_git_checkout: bool,
    pub catalog_url: String,
    /// File extension that marks a directory as holding extension code.
    pub content_marker: String,
    pub core: CoreMirror,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("./data"),
            include_core_mirror: false,
            prefer_git_checkout: false,
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            content_marker: "php".to_string(),
            core: CoreMirror::default(),
        }
    }
}

impl MirrorConfig {
    pub fn trace_loaded(&self) {
        info!(
            data_root = %self.data_root.display(),
            include_core_mirror = self.include_core_mirror,
            prefer_git_checkout = self.prefer_git_checkout,
            catalog_url = %self.catalog_url,
            "Loaded MirrorConfig"
        );
        debug!(?self, "MirrorConfig loaded (full debug)");
    }
}

/// The synthetic task for the wiki core. Its version is a branch name, so it
/// is never compared against a marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreMirror {
    pub name: String,
    pub archive_url: String,
    pub repo_url: String,
    pub version: String,
}

impl Default for CoreMirror {
    fn default() -> Self {
        Self {
            name: "dokuwiki".to_string(),
            archive_url: "https://github.com/dokuwiki/dokuwiki/archive/master.zip".to_string(),
            repo_url: "https://github.com/dokuwiki/dokuwiki.git".to_string(),
            version: "master".to_string(),
        }
    }
}

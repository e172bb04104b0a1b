//! `load_config` module: reads the optional YAML config file and applies
//! environment overrides, producing a [`MirrorConfig`].
//!
//! Every key in the file is optional; missing keys keep their defaults.
//! CLI flags are applied afterwards by [`crate::cli`], so the precedence is
//! defaults < file < environment < flags.
//!
//! # Errors
//! Failures surface as `anyhow::Error` at the CLI boundary.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{error, info};

use crate::config::MirrorConfig;

/// Overrides the catalog endpoint.
pub const CATALOG_URL_ENV: &str = "EXTENSION_MIRROR_CATALOG_URL";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MirrorConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let content = fs::read_to_string(path_ref)
        .map_err(|e| {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            e
        })
        .with_context(|| format!("Failed to read config file {}", path_ref.display()))?;

    let config: MirrorConfig = match serde_yaml::from_str(&content) {
        Ok(config) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            config
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };
    Ok(config)
}

/// Config file if given, defaults otherwise; then environment overrides.
pub fn resolve_config(path: Option<&Path>) -> Result<MirrorConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => MirrorConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

pub fn apply_env_overrides(config: &mut MirrorConfig) {
    if let Ok(url) = std::env::var(CATALOG_URL_ENV) {
        if !url.trim().is_empty() {
            info!(catalog_url = %url, "Catalog URL overridden from environment");
            config.catalog_url = url;
        }
    }
}

//! Config-file loading — YAML overlay for the default paths and names.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::config::ConfigOverlay;

/// Config file consulted when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/nodemend/config.yaml";

/// Load the config overlay.
///
/// An explicitly given path must exist and parse; the default path is
/// optional and silently skipped when absent.
///
/// # Errors
///
/// Returns an error when an explicit path cannot be read or either file
/// fails to parse.
pub fn load_overlay(explicit: Option<&Path>) -> Result<ConfigOverlay> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if !default.exists() {
                return Ok(ConfigOverlay::default());
            }
            default
        }
    };
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
}

// ── Unit tests ────────────────────────────────────────────────────────────────

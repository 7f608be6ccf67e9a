//! Filesystem infrastructure — implements the `HostFiles` port against the
//! real disk, including the timestamped unit-file backup.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;

use crate::application::ports::HostFiles;

/// Production `HostFiles` backed by `std::fs`.
pub struct DiskFiles;

impl HostFiles for DiskFiles {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        std::fs::write(path, content).with_context(|| format!("cannot write {}", path.display()))
    }

    fn write_secret(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
            set_permissions(parent, 0o700)?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("cannot write {}", path.display()))?;
        set_permissions(path, 0o600)?;
        Ok(())
    }

    fn backup(&self, path: &Path) -> Result<PathBuf> {
        let stamp = Utc::now().format("%Y%m%d-%H%M%S");
        let backup = PathBuf::from(format!("{}.{stamp}.bak", path.display()));
        std::fs::copy(path, &backup).with_context(|| {
            format!("cannot back up {} to {}", path.display(), backup.display())
        })?;
        Ok(backup)
    }
}

#[cfg(unix)]
fn set_permissions(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .with_context(|| format!("cannot set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

// ── Unit tests ────────────────────────────────────────────────────────────────

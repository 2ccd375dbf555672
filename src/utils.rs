//! Utility functions for directory management and file output
//!
//! This module provides helper functions following the XDG Base Directory specification
//! for portable configuration and log storage across Linux distributions.
//!
//! # Directory Structure
//!
//! - Config: `~/.config/firewalle/` - Optional `config.json`
//! - State: `~/.local/state/firewalle/` - Log file

use directories::ProjectDirs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "firewalle", "firewalle")
}

pub fn get_config_dir() -> Option<PathBuf> {
    project_dirs().map(|pd| pd.config_dir().to_path_buf())
}

pub fn get_state_dir() -> Option<PathBuf> {
    project_dirs().and_then(|pd| pd.state_dir().map(Path::to_path_buf))
}

pub fn ensure_state_dir() -> std::io::Result<Option<PathBuf>> {
    let Some(dir) = get_state_dir() else {
        return Ok(None);
    };

    #[cfg(unix)]
    {
        use std::fs::DirBuilder;
        use std::os::unix::fs::DirBuilderExt;

        DirBuilder::new()
            .mode(0o700) // User read/write/execute only
            .recursive(true)
            .create(&dir)?;
    }

    #[cfg(not(unix))]
    std::fs::create_dir_all(&dir)?;

    Ok(Some(dir))
}

/// Writes `contents` to `path` atomically.
///
/// The data goes to a temporary file in the same directory, is synced, and is
/// then renamed over `path`. If anything fails the temporary file is removed
/// when it drops, so no partial file is ever left behind.
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;

    temp.persist(path).map_err(|e| {
        if e.error.kind() == std::io::ErrorKind::StorageFull {
            std::io::Error::new(
                std::io::ErrorKind::StorageFull,
                format!("Disk full: cannot write {}. Free up space and try again.", path.display()),
            )
        } else {
            e.error
        }
    })?;
    Ok(())
}

//! Timestamped backups of the target file

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

use crate::error::{Result, SyncError};

/// Sibling backup path: `<file>.backup.<YYYYmmdd_HHMMSS>`
pub fn backup_path<Tz: TimeZone>(path: &Path, now: &DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".backup.{}", now.format("%Y%m%d_%H%M%S")));
    PathBuf::from(name)
}

/// Copy `path` byte for byte to its timestamped backup path
pub fn create_backup<Tz: TimeZone>(path: &Path, now: &DateTime<Tz>) -> Result<PathBuf>
where
    Tz::Offset: std::fmt::Display,
{
    let backup = backup_path(path, now);
    fs::copy(path, &backup)?;
    tracing::info!("Backup created at {}", backup.display());
    Ok(backup)
}

/// Copy a backup back over the target
pub fn restore_backup(backup: &Path, path: &Path) -> Result<()> {
    fs::copy(backup, path).map_err(|e| SyncError::RestoreFailed {
        backup: backup.to_path_buf(),
        message: e.to_string(),
    })?;
    tracing::info!("Restored {} from {}", path.display(), backup.display());
    Ok(())
}

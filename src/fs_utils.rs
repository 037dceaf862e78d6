//! Filesystem helpers for replacing the target file safely
//!
//! - `atomic_rename`: rename that also replaces an existing file on Windows
//! - `write_atomic`: write a sibling temp file, then rename it over the target

use std::io::{self, Write};
use std::path::Path;

/// Cross-platform atomic rename.
///
/// On Unix, `fs::rename` atomically replaces the target if it exists.
/// On Windows, `fs::rename` fails if the target exists, so it is removed first.
pub fn atomic_rename(src: &Path, dst: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        if dst.exists() {
            std::fs::remove_file(dst)?;
        }
    }
    std::fs::rename(src, dst)
}

/// Replace `path` with `contents` without leaving a half-written file.
///
/// The temp file lives in the same directory so the rename never crosses
/// filesystems.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::Builder::new()
        .prefix(".meshcore_sync_write_")
        .tempfile_in(dir)?;
    temp.write_all(contents.as_bytes())?;
    temp.as_file().sync_all()?;
    // keep the mode of the file being replaced (temp files are 0600)
    if let Ok(meta) = std::fs::metadata(path) {
        std::fs::set_permissions(temp.path(), meta.permissions())?;
    }

    let (_, temp_path) = temp.keep().map_err(|e| e.error)?;
    if let Err(e) = atomic_rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e);
    }
    Ok(())
}

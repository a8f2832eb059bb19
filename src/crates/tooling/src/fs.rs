//! Directory and file helpers

use crate::{round_to, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

/// Create a directory and its parents; an existing directory is left alone
pub fn create_dir_if_missing(dir: impl AsRef<Path>) -> Result<()> {
    fs::create_dir_all(dir.as_ref())?;
    Ok(())
}

/// Remove a file or a whole directory tree
///
/// Removing a path that does not exist is a no-op.
pub fn remove_path(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let outcome = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) => Err(e),
    };

    match outcome {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => Ok(other?),
    }
}

/// Empty a directory by recreating it; creates it when missing
pub fn clear_dir(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    remove_path(dir)?;
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Size in bytes of a file, or the recursive total of a directory
///
/// Paths that do not exist count as zero. Symlinks are not followed.
pub fn path_size(path: impl AsRef<Path>) -> Result<u64> {
    let meta = match fs::symlink_metadata(path.as_ref()) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    if !meta.is_dir() {
        return Ok(meta.len());
    }

    let mut total = 0;
    for entry in fs::read_dir(path.as_ref())? {
        total += path_size(entry?.path())?;
    }
    Ok(total)
}

/// Human-readable size with binary units and up to three decimals
///
/// ```rust
/// use tooling::fs::format_size;
///
/// assert_eq!(format_size(512), "512B");
/// assert_eq!(format_size(1024), "1.0KB");
/// assert_eq!(format_size(1536), "1.5KB");
/// assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.0GB");
/// ```
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{}B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = round_to(value, 3);
    if rounded.fract() == 0.0 {
        format!("{:.1}{}", rounded, UNITS[unit])
    } else {
        format!("{}{}", rounded, UNITS[unit])
    }
}

/// [`path_size`] rendered with [`format_size`]
pub fn display_size(path: impl AsRef<Path>) -> Result<String> {
    Ok(format_size(path_size(path)?))
}

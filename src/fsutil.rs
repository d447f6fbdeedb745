//! Filesystem helpers used while assembling a release
//!
//! Tree removal, tree size, whole-file SHA-256 and the two copy flavours the
//! packager needs (an addon copy that skips the top-level manifest, and a
//! plain tree copy for resource staging).

use crate::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Permanently delete `dir` and everything below it.
///
/// Entries are removed depth-first: files and symlinks are unlinked before
/// their parent directory is removed. There is no trash or recovery.
pub fn remove_dir_tree<P: AsRef<Path>>(dir: P) -> Result<()> {
    let dir = dir.as_ref();

    for entry in WalkDir::new(dir).contents_first(true) {
        let entry = entry?;
        if entry.file_type().is_dir() {
            fs::remove_dir(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }

    debug!(path = %dir.display(), "removed directory tree");
    Ok(())
}

/// Sum of the sizes in bytes of every regular file below `dir`.
///
/// Symlinks are not followed and do not count towards the total.
pub fn directory_size<P: AsRef<Path>>(dir: P) -> Result<u64> {
    let mut total = 0;

    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if entry.file_type().is_file() {
            total += entry.metadata()?.len();
        }
    }

    Ok(total)
}

/// Lowercase hex SHA-256 of the file's full contents
pub fn sha256_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let content = fs::read(path)?;
    Ok(sha256_hex(&content))
}

/// Lowercase hex SHA-256 of a byte slice
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Copy every regular file below `source` into `target`, preserving relative
/// paths and creating parent directories as needed.
///
/// Directories are only created as parents of copied files. A file named
/// `skip_top_level` directly inside `source` is not copied, though nested
/// files with the same name are. Returns the number of files copied.
pub fn copy_files_except<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    target: Q,
    skip_top_level: &str,
) -> Result<usize> {
    let source = source.as_ref();
    let target = target.as_ref();
    let mut copied = 0;

    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }

        let relative = entry.path().strip_prefix(source)?;
        let target_path = target.join(relative);
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent)?;
        }

        if entry.depth() == 1 && entry.file_name() == skip_top_level {
            continue;
        }

        fs::copy(entry.path(), &target_path)?;
        copied += 1;
    }

    Ok(copied)
}

/// Recursively copy `source` to `target`, which must not exist yet.
pub fn copy_dir_all<P: AsRef<Path>, Q: AsRef<Path>>(source: P, target: Q) -> Result<()> {
    let source = source.as_ref();
    let target = target.as_ref();

    if !source.is_dir() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("not a directory: {}", source.display()),
        )));
    }
    if target.exists() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("destination already exists: {}", target.display()),
        )));
    }

    for entry in WalkDir::new(source) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(source)?;
        let target_path = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target_path)?;
        } else {
            fs::copy(entry.path(), &target_path)?;
        }
    }

    Ok(())
}

/// Format a byte count for display
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

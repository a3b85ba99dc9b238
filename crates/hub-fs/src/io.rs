//! Atomic I/O operations with file locking
//!
//! All operations on a target file coordinate through an advisory lock held
//! on a sidecar `<name>.lock` file next to it. The sidecar outlives renames of
//! the target, so writers replacing the document and readers opening it agree
//! on a single lock object. Removing the target removes its sidecar.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use fs2::FileExt;

use crate::{Error, Result};

/// Distinguishes temp files written concurrently by threads of one process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::InvalidTarget {
            path: path.to_path_buf(),
        })
}

fn lock_path(path: &Path) -> Result<PathBuf> {
    Ok(path.with_file_name(format!("{}.lock", file_name(path)?)))
}

fn open_lock(path: &Path) -> Result<File> {
    let lock_path = lock_path(path)?;
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|e| Error::io(&lock_path, e))
}

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename so a crash mid-write leaves the previous
/// document intact. The temp file lives in the target directory to keep the
/// rename on one filesystem.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let lock = open_lock(path)?;
    lock.lock_exclusive().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    let temp_path = path.with_file_name(format!(
        ".{}.{}.{}.tmp",
        file_name(path)?,
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    let result = write_then_rename(&temp_path, path, content);
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    // Lock released on drop
    drop(lock);
    result
}

fn write_then_rename(temp_path: &Path, path: &Path, content: &[u8]) -> Result<()> {
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| Error::io(temp_path, e))?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(temp_path, e))?;
    temp_file.sync_all().map_err(|e| Error::io(temp_path, e))?;
    drop(temp_file);

    fs::rename(temp_path, path).map_err(|e| Error::io(path, e))
}

/// Read a file under a shared lock.
///
/// Returns `Ok(None)` when the file does not exist. Nothing is created on
/// disk in that case.
pub fn read_locked(path: &Path) -> Result<Option<Vec<u8>>> {
    if !path.is_file() {
        return Ok(None);
    }

    let lock = open_lock(path)?;
    lock.lock_shared().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    let mut file = match File::open(path) {
        Ok(file) => file,
        // Removed between the existence check and the lock
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io(path, e)),
    };

    let mut buf = Vec::new();
    file.read_to_end(&mut buf).map_err(|e| Error::io(path, e))?;
    Ok(Some(buf))
}

/// Remove a file if present.
///
/// Returns whether a file was removed. Absence is not an error.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }

    let lock = open_lock(path)?;
    lock.lock_exclusive().map_err(|_| Error::LockFailed {
        path: path.to_path_buf(),
    })?;

    let removed = match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed file");
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => return Err(Error::io(path, e)),
    };

    // The sidecar goes too, while still held. Failure leaves only an empty lock file.
    let sidecar = lock_path(path)?;
    match fs::remove_file(&sidecar) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %sidecar.display(), error = %e, "Lock file not removed");
        }
        _ => {}
    }
    Ok(removed)
}

/// Modification time of a file, or `None` if it does not exist.
pub fn modified_at(path: &Path) -> Result<Option<DateTime<Utc>>> {
    match fs::metadata(path) {
        Ok(meta) => {
            let modified = meta.modified().map_err(|e| Error::io(path, e))?;
            Ok(Some(DateTime::<Utc>::from(modified)))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path, e)),
    }
}

//! Safe file I/O utilities: atomic replace and synced append.
//!
//! - [`atomic_replace()`] - Replace a file's whole content (temp file + rename)
//! - [`atomic_append()`] - Append lines and fsync
//! - [`read_if_exists()`] - Read a file's bytes, treating absence as `None`
//!
//! # Atomic Replace
//!
//! Content is written to a sibling `<name>.tmp`, synced, then renamed over the
//! destination. A crash before the rename leaves the destination exactly as
//! it was; a crash after leaves it fully updated. Readers never see a mix.
//!
//! # Append
//!
//! Appends are synced but not all-or-nothing: a crash mid-write can leave a
//! partial final line. Readers go through [`crate::codec::decode_lines`],
//! which skips such a line instead of failing. The next append terminates
//! the partial line first, so only the torn record is lost and never the
//! one written after it.
//!
//! # Storage Root
//!
//! Both writers make sure the destination's parent directory exists first.
//! Only that one directory is created; missing ancestors are an error. An
//! existing non-directory at that path is [`StoreError::InvalidStorageRoot`].
//!
//! Interrupted system calls are retried by `write_all`/`read_to_end`
//! themselves; every other I/O error is returned as-is.

use crate::error::{StoreError, StoreResult};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Suffix appended to the destination name for the replace temp file.
pub const TMP_SUFFIX: &str = ".tmp";

/// Ensure `root` exists as a directory, creating it (one level) if missing.
pub fn ensure_store_root(root: &Path) -> StoreResult<()> {
    match fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(StoreError::InvalidStorageRoot {
            path: root.to_path_buf(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => match fs::create_dir(root) {
            Ok(()) => {
                log::debug!("created storage root {}", root.display());
                Ok(())
            }
            // Lost a race with another creator; fine as long as it is a directory.
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && root.is_dir() => Ok(()),
            Err(e) => Err(StoreError::io("create storage root", root, e)),
        },
        Err(e) => Err(StoreError::io("stat storage root", root, e)),
    }
}

/// Path of the temp sibling used by [`atomic_replace()`].
pub fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(OsString::new);
    name.push(TMP_SUFFIX);
    path.with_file_name(name)
}

fn ensure_parent(path: &Path) -> StoreResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_store_root(parent),
        _ => Ok(()),
    }
}

/// Atomically replace the content of `path`.
///
/// Writes to a temporary file with fsync, then renames it onto `path`. If the
/// rename fails the destination is removed and the rename retried once. On
/// any failure the temporary file is removed and `path` keeps its previous
/// content (or stays absent).
///
/// # Errors
///
/// Returns [`StoreError::InvalidStorageRoot`] if the parent exists but is not
/// a directory, and [`StoreError::Io`] if the temporary file cannot be
/// created, written, synced, or renamed.
pub fn atomic_replace(path: &Path, contents: &[u8]) -> StoreResult<()> {
    ensure_parent(path)?;

    let tmp_path = tmp_path_for(path);

    if let Err(e) = write_synced(&tmp_path, contents) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    if let Err(first) = fs::rename(&tmp_path, path) {
        log::debug!(
            "rename onto {} failed ({}), removing destination and retrying",
            path.display(),
            first
        );
        let _ = fs::remove_file(path);
        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(StoreError::io("rename", path, e));
        }
    }

    Ok(())
}

/// Write `contents` to a fresh file at `path` and sync it to disk.
fn write_synced(path: &Path, contents: &[u8]) -> StoreResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| StoreError::io("create temp file", path, e))?;

    {
        let mut writer = BufWriter::new(&mut file);
        writer
            .write_all(contents)
            .and_then(|()| writer.flush())
            .map_err(|e| StoreError::io("write", path, e))?;
    }

    // Sync to disk before rename
    file.sync_all()
        .map_err(|e| StoreError::io("sync", path, e))
}

/// Append `lines` to `path`, creating it if needed, then fsync.
///
/// `lines` should already be newline-terminated (see
/// [`crate::codec::encode_lines`]). If the file ends in an unterminated line
/// (a torn earlier append), a newline is written first. Appending nothing
/// still creates the file.
pub fn atomic_append(path: &Path, lines: &str) -> StoreResult<()> {
    ensure_parent(path)?;

    let mut file = OpenOptions::new()
        .read(true)
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| StoreError::io("open for append", path, e))?;

    let needs_newline = !lines.is_empty()
        && ends_unterminated(&mut file).map_err(|e| StoreError::io("read tail", path, e))?;
    if needs_newline {
        log::warn!("{} ends in a partial line, terminating it", path.display());
    }

    // Append mode writes at the end regardless of the read position.
    let prefix: &[u8] = if needs_newline { b"\n" } else { b"" };
    file.write_all(prefix)
        .and_then(|()| file.write_all(lines.as_bytes()))
        .and_then(|()| file.flush())
        .map_err(|e| StoreError::io("append", path, e))?;

    // Ensure durability: flush OS buffer cache to disk
    file.sync_all()
        .map_err(|e| StoreError::io("sync", path, e))
}

/// True when `file` is non-empty and its last byte is not `\n`.
fn ends_unterminated(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Read the whole file at `path` as bytes, or `None` if it does not exist.
///
/// No UTF-8 check happens here; decoding is per line.
pub fn read_if_exists(path: &Path) -> StoreResult<Option<Vec<u8>>> {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io("open", path, e)),
    };

    let mut content = Vec::new();
    file.read_to_end(&mut content)
        .map_err(|e| StoreError::io("read", path, e))?;
    Ok(Some(content))
}

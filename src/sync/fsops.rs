//! Filesystem helpers shared by the materializer and the preference merge

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tempfile::NamedTempFile;

use crate::error::NyoomError;

/// Recursively copy `src` into `dst`, creating `dst` as needed.
/// Names in `skip` are ignored at the top level only.
pub fn copy_dir_all(src: &Path, dst: &Path, skip: &[&str]) -> Result<(), NyoomError> {
    fs::create_dir_all(dst).map_err(NyoomError::io("create directory", dst))?;

    for entry in fs::read_dir(src).map_err(NyoomError::io("read directory", src))? {
        let entry = entry.map_err(NyoomError::io("read directory", src))?;
        let name = entry.file_name();
        if skip.iter().any(|s| name == *s) {
            continue;
        }

        let from = entry.path();
        let to = dst.join(&name);
        let ty = entry.file_type().map_err(NyoomError::io("stat", &from))?;

        if ty.is_dir() {
            copy_dir_all(&from, &to, &[])?;
        } else if ty.is_symlink() {
            copy_symlink(&from, &to)?;
        } else {
            // fs::copy carries the permission bits over
            fs::copy(&from, &to).map_err(NyoomError::io("copy", &from))?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> Result<(), NyoomError> {
    let target = fs::read_link(from).map_err(NyoomError::io("read link", from))?;
    std::os::unix::fs::symlink(&target, to).map_err(NyoomError::io("create link", to))
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> Result<(), NyoomError> {
    if from.is_dir() {
        copy_dir_all(from, to, &[])
    } else {
        fs::copy(from, to).map(|_| ()).map_err(NyoomError::io("copy", from))
    }
}

/// Unused `<name>.nyoom-<unix secs>.bak` next to `path`
pub fn backup_path(path: &Path) -> PathBuf {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "nyoom".to_string());

    let mut candidate = path.with_file_name(format!("{name}.nyoom-{secs}.bak"));
    let mut n = 1;
    while fs::symlink_metadata(&candidate).is_ok() {
        candidate = path.with_file_name(format!("{name}.nyoom-{secs}-{n}.bak"));
        n += 1;
    }
    candidate
}

/// Replace `path` with `contents` via a temp file in the same directory and a rename.
/// Permissions of an existing file are kept, symlinks are written through.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), NyoomError> {
    let target = match fs::canonicalize(path) {
        Ok(resolved) => resolved,
        Err(_) => path.to_path_buf(),
    };
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir).map_err(NyoomError::io("create temp file in", dir))?;
    tmp.write_all(contents.as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(NyoomError::io("write", tmp.path()))?;

    if let Ok(meta) = fs::metadata(&target) {
        fs::set_permissions(tmp.path(), meta.permissions())
            .map_err(NyoomError::io("set permissions on", tmp.path()))?;
    }

    tmp.persist(&target)
        .map_err(|e| NyoomError::io("replace", &target)(e.error))?;
    Ok(())
}

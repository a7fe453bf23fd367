//! File path helpers shared by the reader and the writer

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Resolve `file_name` against `base_path`.
///
/// Absolute file names are returned unchanged; relative ones are joined
/// onto the base path.
pub fn resolve_path(file_name: impl AsRef<Path>, base_path: impl AsRef<Path>) -> PathBuf {
    let file_name = file_name.as_ref();
    if file_name.is_absolute() {
        file_name.to_path_buf()
    } else {
        base_path.as_ref().join(file_name)
    }
}

/// Create `dir` and any missing parents; an empty path is the current
/// directory and needs nothing.
pub fn ensure_directory(dir: impl AsRef<Path>) -> io::Result<()> {
    let dir = dir.as_ref();
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir)
}

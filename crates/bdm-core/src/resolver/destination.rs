//! Destination hint interpretation and directory preparation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DestinationError;

/// Prefix of the scoped temp file used to check write access.
const WRITE_CHECK_PREFIX: &str = ".bdm-write-check-";

/// Where a task's output goes, before a filename has been inferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Save into this directory under an inferred filename.
    Directory(PathBuf),
    /// Save under exactly this directory and filename.
    File { directory: PathBuf, filename: String },
}

impl Destination {
    pub fn directory(&self) -> &Path {
        match self {
            Destination::Directory(dir) => dir,
            Destination::File { directory, .. } => directory,
        }
    }
}

/// Interprets a destination hint relative to `cwd`.
///
/// - empty → `cwd`, filename inferred
/// - existing directory, or ends with a path separator → that directory, filename inferred
/// - `force_directory` → treated as a directory even if it does not exist yet
/// - otherwise → parent directory plus the hint's final segment as filename
///
/// The existence check is best-effort: another process may create or remove the
/// path between this call and the download.
pub fn interpret_hint(hint: &str, cwd: &Path, force_directory: bool) -> Destination {
    if hint.trim().is_empty() {
        return Destination::Directory(cwd.to_path_buf());
    }
    let path = absolute(Path::new(hint), cwd);
    if force_directory || ends_with_separator(hint) || path.is_dir() {
        return Destination::Directory(path);
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => Destination::File {
            directory: parent.to_path_buf(),
            filename: name.to_string_lossy().into_owned(),
        },
        _ => Destination::Directory(path),
    }
}

fn ends_with_separator(hint: &str) -> bool {
    hint.ends_with('/') || hint.ends_with(std::path::MAIN_SEPARATOR)
}

fn absolute(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Ensures `dir` exists (idempotent create) and that files can be created in it.
///
/// The write check creates a temp file that is removed when dropped, so it
/// never outlives this call whichever way it returns.
pub fn prepare_directory(dir: &Path) -> Result<(), DestinationError> {
    if dir.exists() && !dir.is_dir() {
        return Err(DestinationError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }
    fs::create_dir_all(dir).map_err(|source| DestinationError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let probe = tempfile::Builder::new()
        .prefix(WRITE_CHECK_PREFIX)
        .tempfile_in(dir)
        .map_err(|source| DestinationError::NotWritable {
            path: dir.to_path_buf(),
            source,
        })?;
    drop(probe);
    Ok(())
}

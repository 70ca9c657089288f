use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;
use tracing::debug;

use crate::Error;
use crate::Result;

fn path_error(
    path: &Path,
    source: std::io::Error,
) -> Error {
    Error::PathError {
        path: path.to_path_buf(),
        source,
    }
}

/// Deletes `path` if it exists; a missing file is not an error.
///
/// Returns whether a file was removed.
pub async fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => {
            debug!(?path, "removed file");
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(path_error(path, e)),
    }
}

/// Wipes `path` and recreates it empty.
pub async fn reset_directory(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => debug!(?path, "wiped directory"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(path_error(path, e)),
    }
    ensure_directory(path).await
}

/// Creates `path` and its parents if missing, keeping existing contents.
pub async fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path).await.map_err(|e| path_error(path, e))
}

/// Whether `path` is an existing directory without entries
pub async fn is_empty_dir(path: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(path).await.map_err(|e| path_error(path, e))?;
    Ok(entries.next_entry().await.map_err(|e| path_error(path, e))?.is_none())
}

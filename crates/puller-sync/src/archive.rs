//! Branch tarball extraction.
//!
//! GitHub archives unpack to a single `{owner}-{repo}-{sha}` top-level
//! directory; everything of interest lives under it.

use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

use crate::SyncError;

/// Unpack a `.tar.gz` archive into `dest`. Blocking; callers on the async
/// path run this through `spawn_blocking`.
pub fn extract_tarball(archive_path: &Path, dest: &Path) -> Result<(), SyncError> {
    std::fs::create_dir_all(dest)?;
    let file = std::fs::File::open(archive_path)
        .map_err(|e| SyncError::ExtractFailed(format!("cannot open archive: {e}")))?;
    let decoder = GzDecoder::new(file);
    let mut archive = Archive::new(decoder);
    archive
        .unpack(dest)
        .map_err(|e| SyncError::ExtractFailed(e.to_string()))?;
    Ok(())
}

/// Find the archive's top-level directory inside an extraction dir.
pub fn archive_root(extracted: &Path) -> Result<PathBuf, SyncError> {
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(extracted)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| entry.path())
        .collect();
    dirs.sort();

    match dirs.into_iter().next() {
        Some(dir) => Ok(dir),
        None => Err(SyncError::ExtractFailed(
            "archive has no top-level directory".to_string(),
        )),
    }
}

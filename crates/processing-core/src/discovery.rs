//! Source tree discovery.

use std::path::Path;

use chrono::{DateTime, Local};
use proxygen_common::error::{ProxyError, ProxygenResult};
use proxygen_media_model::video::VideoFile;
use walkdir::WalkDir;

/// Recursively collect every allow-listed video under `root`.
///
/// The walk is depth-first with entries sorted by file name at every
/// directory level, so repeated runs over the same tree yield the same
/// order. A missing or non-directory root is fatal; an empty result is not.
pub fn discover(root: &Path) -> ProxygenResult<Vec<VideoFile>> {
    if !root.is_dir() {
        return Err(ProxyError::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    let root = root.canonicalize()?;

    tracing::info!(root = %root.display(), "Scanning for video files");

    let mut files = Vec::new();
    for entry in WalkDir::new(&root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "Skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path().to_path_buf();
        let relative_path = path
            .strip_prefix(&root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.clone());
        let modified = match entry
            .metadata()
            .map_err(std::io::Error::from)
            .and_then(|meta| meta.modified())
        {
            Ok(modified) => Some(DateTime::<Local>::from(modified)),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "Could not read modification time"
                );
                None
            }
        };

        if let Some(file) = VideoFile::new(path, relative_path, modified) {
            tracing::debug!(path = %file.path.display(), "Discovered video");
            files.push(file);
        }
    }

    tracing::info!(count = files.len(), "Discovery complete");
    Ok(files)
}

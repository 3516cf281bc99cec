//! Discovered source videos.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Container extensions accepted by discovery (lowercase, without the dot).
pub const VIDEO_EXTENSIONS: [&str; 9] = [
    "mp4", "avi", "mov", "mkv", "wmv", "flv", "webm", "m4v", "3gp",
];

/// Check whether an extension (any case, with or without leading dot) is on
/// the allow-list.
pub fn is_video_extension(ext: &str) -> bool {
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    VIDEO_EXTENSIONS.contains(&ext.as_str())
}

/// A source video found under the scan root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFile {
    /// Absolute path to the file.
    pub path: PathBuf,

    /// Path relative to the scan root.
    pub relative_path: PathBuf,

    /// Extension as found on disk (original case, no dot).
    pub extension: String,

    /// Filesystem modification time, if the stat call succeeded.
    pub modified: Option<DateTime<Local>>,
}

impl VideoFile {
    /// Build a record for a discovered file. Returns `None` when the path has
    /// no allow-listed extension.
    pub fn new(
        path: PathBuf,
        relative_path: PathBuf,
        modified: Option<DateTime<Local>>,
    ) -> Option<Self> {
        let extension = path.extension()?.to_string_lossy().into_owned();
        if !is_video_extension(&extension) {
            return None;
        }
        Some(Self {
            path,
            relative_path,
            extension,
            modified,
        })
    }

    /// Base name without extension.
    pub fn stem(&self) -> String {
        file_stem(&self.path)
    }

    /// File name including extension, for display.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Base name of a path with its extension stripped.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

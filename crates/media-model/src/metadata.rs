//! Best-effort per-file metadata.

use serde::{Deserialize, Serialize};

/// Metadata shown on a proxy's title card.
///
/// `source_file_name` is always known. The other fields are best-effort and
/// absent whenever their signal could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Capture date formatted `YYYY-MM-DD HH:MM`.
    pub capture_date: Option<String>,

    /// Human-readable location.
    pub location: Option<String>,

    /// Base name of the source without its extension.
    pub source_file_name: String,
}

impl Metadata {
    /// Metadata with only the file name known.
    pub fn for_file(source_file_name: impl Into<String>) -> Self {
        Self {
            capture_date: None,
            location: None,
            source_file_name: source_file_name.into(),
        }
    }
}

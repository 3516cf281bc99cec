//! Best-effort metadata resolution.
//!
//! Each field walks its own fallback chain and degrades to `None` instead of
//! failing:
//!
//! ```text
//! capture_date: embedded creation_time ─▶ mtime seen at discovery ─▶ None
//! location:     embedded GPS tag ───────▶ filename gazetteer ─▶ None
//! file name:    base name without extension (always present)
//! ```
//!
//! The gazetteer is a coarse keyword match against the file name, not a
//! geocoder.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Local};
use proxygen_common::error::ProxygenResult;
use proxygen_media_model::metadata::Metadata;
use proxygen_media_model::video::VideoFile;

/// Location keywords matched against file names, in priority order.
pub const GAZETTEER: [&str; 5] = ["paris", "london", "tokyo", "nyc", "berlin"];

/// Display format for capture dates.
pub const CAPTURE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Tags read from inside a container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddedTags {
    pub creation_time: Option<DateTime<Local>>,
    pub location: Option<String>,
}

/// Reader for metadata embedded in the container itself.
///
/// Chosen once at startup; [`NoEmbeddedMetadata`] is the fallback when no
/// reader is available.
pub trait EmbeddedMetadata: Send + Sync {
    /// Whether this reader can produce tags at all.
    fn supports_location_extraction(&self) -> bool;

    /// Read tags from one file.
    fn read_tags(&self, path: &Path) -> ProxygenResult<EmbeddedTags>;
}

/// Reader that never finds embedded tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEmbeddedMetadata;

impl EmbeddedMetadata for NoEmbeddedMetadata {
    fn supports_location_extraction(&self) -> bool {
        false
    }

    fn read_tags(&self, _path: &Path) -> ProxygenResult<EmbeddedTags> {
        Ok(EmbeddedTags::default())
    }
}

/// Resolves [`Metadata`] for one file at a time.
#[derive(Clone)]
pub struct MetadataResolver {
    embedded: Arc<dyn EmbeddedMetadata>,
}

impl MetadataResolver {
    /// Create a resolver that consults `embedded` first.
    pub fn new(embedded: Arc<dyn EmbeddedMetadata>) -> Self {
        Self { embedded }
    }

    /// Resolver using only the filesystem and the file name.
    pub fn filesystem_only() -> Self {
        Self::new(Arc::new(NoEmbeddedMetadata))
    }

    /// Whether embedded tags will be consulted.
    pub fn uses_embedded_tags(&self) -> bool {
        self.embedded.supports_location_extraction()
    }

    /// Resolve metadata for a discovered file. Never fails.
    pub fn resolve(&self, file: &VideoFile) -> Metadata {
        let path = file.path.as_path();
        let source_file_name = file.stem();

        let tags = if self.embedded.supports_location_extraction() {
            match self.embedded.read_tags(path) {
                Ok(tags) => tags,
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "Embedded tags unavailable, using fallbacks"
                    );
                    EmbeddedTags::default()
                }
            }
        } else {
            EmbeddedTags::default()
        };

        let capture_date = tags
            .creation_time
            .as_ref()
            .map(format_capture_date)
            .or_else(|| file.modified.as_ref().map(format_capture_date));

        let location = tags
            .location
            .or_else(|| guess_location(&source_file_name));

        Metadata {
            capture_date,
            location,
            source_file_name,
        }
    }
}

impl Default for MetadataResolver {
    fn default() -> Self {
        Self::filesystem_only()
    }
}

/// Format a timestamp for the title card.
pub fn format_capture_date(time: &DateTime<Local>) -> String {
    time.format(CAPTURE_DATE_FORMAT).to_string()
}

/// Match a file name against the gazetteer.
///
/// The first gazetteer entry contained in the name (case-insensitive) wins,
/// regardless of where it appears in the name.
pub fn guess_location(name: &str) -> Option<String> {
    let lowered = name.to_lowercase();
    GAZETTEER
        .iter()
        .find(|keyword| lowered.contains(*keyword))
        .map(|keyword| title_case(keyword))
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxygen_common::error::ProxyError;
    use std::path::PathBuf;

    struct FixedTags(EmbeddedTags);

    impl EmbeddedMetadata for FixedTags {
        fn supports_location_extraction(&self) -> bool {
            true
        }

        fn read_tags(&self, _path: &Path) -> ProxygenResult<EmbeddedTags> {
            Ok(self.0.clone())
        }
    }

    struct BrokenTags;

    impl EmbeddedMetadata for BrokenTags {
        fn supports_location_extraction(&self) -> bool {
            true
        }

        fn read_tags(&self, _path: &Path) -> ProxygenResult<EmbeddedTags> {
            Err(ProxyError::metadata("ffprobe exited with status 1"))
        }
    }

    fn video(path: &str, modified: Option<DateTime<Local>>) -> VideoFile {
        let path = PathBuf::from(path);
        let relative = PathBuf::from(path.file_name().unwrap());
        VideoFile::new(path, relative, modified).unwrap()
    }

    fn noon() -> DateTime<Local> {
        DateTime::parse_from_rfc3339("2021-06-01T12:30:00Z")
            .unwrap()
            .with_timezone(&Local)
    }

    #[test]
    fn test_location_from_filename() {
        let file = video("/media/trip_to_paris_2021.mov", None);

        let metadata = MetadataResolver::filesystem_only().resolve(&file);
        assert_eq!(metadata.location.as_deref(), Some("Paris"));
        assert_eq!(metadata.source_file_name, "trip_to_paris_2021");
    }

    #[test]
    fn test_no_location_match() {
        let file = video("/media/clip01.mov", None);

        let metadata = MetadataResolver::filesystem_only().resolve(&file);
        assert_eq!(metadata.location, None);
        assert_eq!(metadata.source_file_name, "clip01");
    }

    #[test]
    fn test_gazetteer_order_wins_over_position() {
        assert_eq!(guess_location("berlin_then_LONDON").as_deref(), Some("London"));
        assert_eq!(guess_location("NYC-marathon").as_deref(), Some("Nyc"));
        assert_eq!(guess_location("Tokyo"), Some("Tokyo".to_string()));
    }

    #[test]
    fn test_capture_date_from_mtime() {
        let file = video("/media/clip.mp4", Some(noon()));

        let metadata = MetadataResolver::filesystem_only().resolve(&file);
        assert_eq!(metadata.capture_date, Some(format_capture_date(&noon())));
        let date = metadata.capture_date.unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(&date, CAPTURE_DATE_FORMAT).is_ok());
    }

    #[test]
    fn test_capture_date_comes_from_discovered_mtime() {
        // The record is the only source; the path is never stat'ed again.
        let file = video("/nonexistent/clip.mp4", Some(noon()));

        let metadata = MetadataResolver::filesystem_only().resolve(&file);
        assert_eq!(metadata.capture_date, Some(format_capture_date(&noon())));
    }

    #[test]
    fn test_missing_mtime_degrades_date_only() {
        let file = video("/nonexistent/london.mkv", None);

        let metadata = MetadataResolver::filesystem_only().resolve(&file);
        assert_eq!(metadata.capture_date, None);
        assert_eq!(metadata.location.as_deref(), Some("London"));
        assert_eq!(metadata.source_file_name, "london");
    }

    #[test]
    fn test_embedded_tags_take_precedence() {
        let file = video("/media/paris.mov", Some(Local::now()));
        let creation = noon();

        let resolver = MetadataResolver::new(Arc::new(FixedTags(EmbeddedTags {
            creation_time: Some(creation),
            location: Some("48.8566, 2.3522".to_string()),
        })));
        assert!(resolver.uses_embedded_tags());

        let metadata = resolver.resolve(&file);
        assert_eq!(metadata.capture_date, Some(format_capture_date(&creation)));
        assert_eq!(metadata.location.as_deref(), Some("48.8566, 2.3522"));
    }

    #[test]
    fn test_embedded_failure_falls_back() {
        let file = video("/media/tokyo_night.mp4", Some(noon()));

        let metadata = MetadataResolver::new(Arc::new(BrokenTags)).resolve(&file);
        assert_eq!(metadata.capture_date, Some(format_capture_date(&noon())));
        assert_eq!(metadata.location.as_deref(), Some("Tokyo"));
    }
}

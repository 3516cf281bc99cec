//! Title card composition.

use proxygen_media_model::metadata::Metadata;
use proxygen_media_model::title_card::{TitleCard, TitleStyle};

/// Builds the overlay card for a proxy from its metadata.
#[derive(Debug, Clone, Default)]
pub struct TitleCardComposer {
    style: TitleStyle,
}

impl TitleCardComposer {
    /// Lines are `Date`, `Location`, then `File`; absent fields are skipped,
    /// so the card always holds at least the file line.
    pub fn compose(&self, metadata: &Metadata) -> TitleCard {
        let mut lines = Vec::with_capacity(3);
        if let Some(date) = &metadata.capture_date {
            lines.push(format!("Date: {date}"));
        }
        if let Some(location) = &metadata.location {
            lines.push(format!("Location: {location}"));
        }
        lines.push(format!("File: {}", metadata.source_file_name));

        TitleCard {
            lines,
            style: self.style.clone(),
        }
    }
}

//! Title card overlay content and style.

use serde::{Deserialize, Serialize};

use crate::clip::CLIP_DURATION_SECS;

/// Corner of the frame the card is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Visual style of the title card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleStyle {
    /// Font size in output pixels.
    pub font_size: u32,
    /// Text fill color (ffmpeg color name or hex).
    pub font_color: String,
    /// Outline color.
    pub stroke_color: String,
    /// Outline width in pixels.
    pub stroke_width: u32,
    /// Frame corner the text block is anchored to.
    pub anchor: Anchor,
    /// Distance from the anchored edges, in pixels.
    pub margin: u32,
    /// How long the card stays on screen (seconds).
    pub duration_secs: f64,
}

impl Default for TitleStyle {
    fn default() -> Self {
        Self {
            font_size: 20,
            font_color: "white".to_string(),
            stroke_color: "black".to_string(),
            stroke_width: 2,
            anchor: Anchor::TopLeft,
            margin: 10,
            duration_secs: CLIP_DURATION_SECS,
        }
    }
}

/// Text overlay burned into a proxy.
///
/// Lines are ordered top to bottom; the card is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleCard {
    pub lines: Vec<String>,
    pub style: TitleStyle,
}

impl TitleCard {
    /// The card text with one line per entry.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

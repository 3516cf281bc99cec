//! Title overlay compositing.
//!
//! Turns a [`TitleCard`] into a positioned text layer and the ffmpeg filter
//! graph that scales the source and burns the layer in.

use proxygen_media_model::title_card::{Anchor, TitleCard, TitleStyle};

/// File name the layer text is written to inside the render workspace.
///
/// ffmpeg runs with the workspace as its working directory, so the filter
/// can reference the file without escaping an absolute path.
pub const TITLE_TEXT_FILE: &str = "title.txt";

/// A text layer ready for compositing.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleLayer {
    /// Text with one line per card line.
    pub text: String,
    /// Visual style.
    pub style: TitleStyle,
}

impl TitleLayer {
    pub fn from_card(card: &TitleCard) -> Self {
        Self {
            text: card.text(),
            style: card.style.clone(),
        }
    }

    /// Horizontal and vertical position expressions for `drawtext`.
    pub fn position(&self) -> (String, String) {
        let m = self.style.margin;
        match self.style.anchor {
            Anchor::TopLeft => (format!("{m}"), format!("{m}")),
            Anchor::TopRight => (format!("w-tw-{m}"), format!("{m}")),
            Anchor::BottomLeft => (format!("{m}"), format!("h-th-{m}")),
            Anchor::BottomRight => (format!("w-tw-{m}"), format!("h-th-{m}")),
        }
    }

    /// `drawtext` filter reading the layer text from [`TITLE_TEXT_FILE`].
    pub fn drawtext_filter(&self) -> String {
        let (x, y) = self.position();
        format!(
            "drawtext=textfile={file}:fontsize={size}:fontcolor={color}:borderw={stroke_w}:bordercolor={stroke}:x={x}:y={y}:enable='between(t,0,{duration:.3})'",
            file = TITLE_TEXT_FILE,
            size = self.style.font_size,
            color = self.style.font_color,
            stroke_w = self.style.stroke_width,
            stroke = self.style.stroke_color,
            duration = self.style.duration_secs,
        )
    }
}

/// Filter graph: scale input video, composite the layer, label `[vout]`.
///
/// The last frame is cloned for `duration_secs` so a source that ends early
/// still fills the whole window.
pub fn build_filter_graph(
    width: u32,
    height: u32,
    duration_secs: f64,
    layer: &TitleLayer,
) -> String {
    format!(
        "[0:v]scale={width}:{height}:flags=lanczos,{drawtext},\
         tpad=stop_mode=clone:stop_duration={duration_secs:.3},format=yuv420p[vout]",
        drawtext = layer.drawtext_filter(),
    )
}

/// Output height preserving the source aspect ratio at `target_width`.
///
/// Rounded down to an even number (minimum 2) for yuv420p encoding.
pub fn target_height(source_width: u32, source_height: u32, target_width: u32) -> u32 {
    if source_width == 0 || source_height == 0 {
        return 2;
    }
    let height = (target_width as u64 * source_height as u64 / source_width as u64)
        .min(u32::MAX as u64) as u32;
    (height - height % 2).max(2)
}

//! Clip windows cut from each source.

use serde::{Deserialize, Serialize};

/// Length of every proxy clip, in seconds.
pub const CLIP_DURATION_SECS: f64 = 5.0;

/// A contiguous time range within a source video.
///
/// Invariant: `start_secs >= 0` and `start_secs + duration_secs` never
/// exceeds the source duration it was selected from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipWindow {
    /// Offset into the source (seconds).
    pub start_secs: f64,
    /// Window length (seconds). Always [`CLIP_DURATION_SECS`].
    pub duration_secs: f64,
}

impl ClipWindow {
    /// Window of the fixed clip length starting at `start_secs`.
    pub fn starting_at(start_secs: f64) -> Self {
        Self {
            start_secs: start_secs.max(0.0),
            duration_secs: CLIP_DURATION_SECS,
        }
    }

    /// End of the window (seconds).
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }

    /// Whether the window lies entirely within a source of the given length.
    pub fn fits_within(&self, source_duration_secs: f64) -> bool {
        self.start_secs >= 0.0 && self.end_secs() <= source_duration_secs
    }
}

/// Outcome of choosing a window for one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClipSelection {
    /// A window was chosen.
    Window(ClipWindow),
    /// The source cannot supply a full window. This is an expected outcome.
    Rejected { reason: String },
}

//! Progress reporting boundary.
//!
//! The orchestrator reports through [`ProgressSink`] and never prints; the
//! CLI decides how progress is presented.

/// Receiver of batch progress.
pub trait ProgressSink: Send + Sync {
    /// Called once with the number of files about to be processed.
    fn begin(&self, _total: u64) {}

    /// Describe what is currently happening.
    fn set_label(&self, label: &str);

    /// Mark `count` more files as finished.
    fn advance(&self, count: u64);

    /// Emit a line of output without disturbing the progress display.
    fn write_line(&self, line: &str);

    /// Called once after the last file.
    fn finish(&self) {}
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn set_label(&self, _label: &str) {}

    fn advance(&self, _count: u64) {}

    fn write_line(&self, _line: &str) {}
}

//! Terminal progress bar.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use proxygen_batch::ProgressSink;

const TEMPLATE: &str = "{spinner:.green} Processing videos [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}";

/// [`ProgressSink`] drawing an indicatif bar on stderr.
///
/// Result lines go through the bar so they are not overwritten by redraws.
/// When stderr is not a terminal the bar is hidden and lines go to stdout.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
        bar.set_style(
            ProgressStyle::with_template(TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BarProgress {
    fn begin(&self, total: u64) {
        self.write_line(&format!("Found {total} video files"));
        self.bar.set_length(total);
        self.bar.set_position(0);
    }

    fn set_label(&self, label: &str) {
        self.bar.set_message(label.to_string());
    }

    fn advance(&self, count: u64) {
        self.bar.inc(count);
    }

    fn write_line(&self, line: &str) {
        if self.bar.is_hidden() {
            println!("{line}");
        } else {
            self.bar.println(line);
        }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

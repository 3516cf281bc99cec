//! Human-readable run reports.

use std::fmt::Write as _;

use proxygen_batch::BatchReport;
use proxygen_common::error::ProxyError;

pub fn print_report(report: &BatchReport) {
    print!("{}", render_report(report));
}

/// Text shown after a run.
pub fn render_report(report: &BatchReport) -> String {
    let mut out = String::new();
    match report {
        BatchReport::DryRun { files, .. } => {
            if files.is_empty() {
                out.push_str("No video files found.\n");
                return out;
            }
            let _ = writeln!(out, "Found {} video files", files.len());
            out.push_str("\nFiles that would be processed:\n");
            for file in files {
                let _ = writeln!(out, "  {}", file.path.display());
            }
        }
        BatchReport::Completed(summary) => {
            if summary.total == 0 {
                out.push_str("No video files found.\n");
                return out;
            }
            out.push_str("\nProcessing complete:\n");
            let _ = writeln!(out, "  ✓ Successful: {}", summary.succeeded);
            let _ = writeln!(out, "  ✗ Failed: {}", summary.failed);
            let _ = writeln!(out, "  Source directory: {}", summary.source_dir.display());
            let _ = writeln!(out, "  Output directory: {}", summary.output_dir.display());
        }
    }
    out
}

/// One-line description of a fatal error.
pub fn describe_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ProxyError>() {
        Some(ProxyError::NotADirectory { path }) => {
            format!("Input directory '{}' does not exist.", path.display())
        }
        _ => format!("{err:#}"),
    }
}

//! Per-file outcomes and the batch summary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Terminal state of one file's pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProxyOutcome {
    /// The proxy was written to `output_path`.
    Rendered { output_path: PathBuf },
    /// The source could not supply a full clip window.
    Rejected { reason: String },
    /// Probing, rendering, or writing failed.
    Failed { reason: String },
    /// The run was interrupted before this file started.
    Cancelled,
}

/// Result of processing one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyResult {
    pub source_path: PathBuf,
    #[serde(flatten)]
    pub outcome: ProxyOutcome,
}

impl ProxyResult {
    pub fn rendered(source_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            outcome: ProxyOutcome::Rendered {
                output_path: output_path.into(),
            },
        }
    }

    pub fn rejected(source_path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            outcome: ProxyOutcome::Rejected {
                reason: reason.into(),
            },
        }
    }

    pub fn failed(source_path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            outcome: ProxyOutcome::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn cancelled(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            outcome: ProxyOutcome::Cancelled,
        }
    }

    /// Whether a proxy was produced.
    pub fn success(&self) -> bool {
        matches!(self.outcome, ProxyOutcome::Rendered { .. })
    }

    /// Output path, present only on success.
    pub fn output_path(&self) -> Option<&Path> {
        match &self.outcome {
            ProxyOutcome::Rendered { output_path } => Some(output_path),
            _ => None,
        }
    }

    /// Failure reason, present only when no proxy was produced.
    pub fn reason(&self) -> Option<&str> {
        match &self.outcome {
            ProxyOutcome::Rendered { .. } => None,
            ProxyOutcome::Rejected { reason } | ProxyOutcome::Failed { reason } => Some(reason),
            ProxyOutcome::Cancelled => Some("cancelled before processing"),
        }
    }
}

/// Aggregate of one batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub total: usize,
    pub succeeded: usize,
    /// Failed, rejected, and cancelled files.
    pub failed: usize,
    /// One entry per discovered file, in discovery order.
    pub results: Vec<ProxyResult>,
}

impl BatchSummary {
    /// Tally results. `results` must already be in discovery order.
    pub fn from_results(
        source_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        results: Vec<ProxyResult>,
    ) -> Self {
        let succeeded = results.iter().filter(|r| r.success()).count();
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// Whether every file produced a proxy (true for an empty batch).
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Process exit status for this run.
    pub fn exit_code(&self) -> i32 {
        if self.all_succeeded() {
            0
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_accessors_follow_outcome() {
        let ok = ProxyResult::rendered("/in/a.mp4", "/out/a_proxy.mp4");
        assert!(ok.success());
        assert_eq!(ok.output_path(), Some(Path::new("/out/a_proxy.mp4")));
        assert_eq!(ok.reason(), None);

        let rejected = ProxyResult::rejected("/in/b.mp4", "too short");
        assert!(!rejected.success());
        assert_eq!(rejected.output_path(), None);
        assert_eq!(rejected.reason(), Some("too short"));

        assert!(ProxyResult::cancelled("/in/c.mp4").reason().is_some());
    }

    #[test]
    fn test_summary_counts_rejections_as_failures() {
        let summary = BatchSummary::from_results(
            "/in",
            "/out",
            vec![
                ProxyResult::rendered("/in/a.mp4", "/out/a_proxy.mp4"),
                ProxyResult::rejected("/in/b.mp4", "too short"),
                ProxyResult::failed("/in/c.mp4", "ffmpeg failed"),
            ],
        );
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn test_empty_summary_exits_zero() {
        let summary = BatchSummary::from_results("/in", "/out", Vec::new());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.exit_code(), 0);
    }

    #[test]
    fn test_result_serializes_flat() {
        let json =
            serde_json::to_value(ProxyResult::failed("/in/c.mp4", "codec error")).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "codec error");
        assert_eq!(json["source_path"], "/in/c.mp4");
    }
}

//! Batch orchestration.
//!
//! Discovers the source tree, plans output names, runs every file through a
//! [`FilePipeline`] with at most `jobs` renders in flight, and aggregates
//! the outcomes in discovery order.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use proxygen_common::config::AppConfig;
use proxygen_common::error::{ProxyError, ProxygenResult};
use proxygen_media_model::result::{BatchSummary, ProxyResult};
use proxygen_media_model::video::VideoFile;
use proxygen_processing_core::clip_select::RandomSource;
use proxygen_processing_core::discovery::discover;
use proxygen_processing_core::metadata::MetadataResolver;
use proxygen_processing_core::naming::plan_output_names;
use proxygen_render_engine::renderer::{ProxyRenderer, RenderTarget};
use serde::Serialize;
use tokio::sync::Semaphore;

use crate::pipeline::FilePipeline;
use crate::progress::{NullProgress, ProgressSink};

/// Parameters of one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Proxy width in pixels.
    pub target_width: u32,
    /// Maximum concurrent renders; 1 processes files strictly in sequence.
    pub jobs: usize,
    /// List discovered files and stop.
    pub dry_run: bool,
}

impl BatchOptions {
    pub fn new(source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            target_width: 640,
            jobs: 1,
            dry_run: false,
        }
    }

    /// Options taken from the loaded configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            source_dir: config.source_dir.clone(),
            output_dir: config.output_dir.clone(),
            target_width: config.proxy.width,
            jobs: config.proxy.jobs,
            dry_run: false,
        }
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BatchReport {
    /// Discovery only; nothing was written.
    DryRun {
        source_dir: PathBuf,
        files: Vec<VideoFile>,
    },
    /// Every discovered file reached a terminal state (or was cancelled).
    Completed(BatchSummary),
}

impl BatchReport {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::DryRun { .. } => 0,
            Self::Completed(summary) => summary.exit_code(),
        }
    }

    pub fn summary(&self) -> Option<&BatchSummary> {
        match self {
            Self::DryRun { .. } => None,
            Self::Completed(summary) => Some(summary),
        }
    }
}

/// Runs batches of files through the proxy pipeline.
pub struct BatchOrchestrator {
    pipeline: FilePipeline,
    progress: Arc<dyn ProgressSink>,
    stop_flag: Arc<AtomicBool>,
}

impl BatchOrchestrator {
    pub fn new(renderer: ProxyRenderer, resolver: MetadataResolver) -> Self {
        Self {
            pipeline: FilePipeline::new(renderer, resolver),
            progress: Arc::new(NullProgress),
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_random_source(mut self, rng: Box<dyn RandomSource>) -> Self {
        self.pipeline = self.pipeline.with_random_source(rng);
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Flag that stops the run from starting further files once set.
    ///
    /// Renders already in flight finish; files not yet started are reported
    /// as cancelled.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Run one batch.
    ///
    /// Errors are reserved for conditions that make the whole run
    /// impossible. Everything that goes wrong with a single file is part of
    /// the returned summary.
    pub async fn run(&self, options: &BatchOptions) -> ProxygenResult<BatchReport> {
        let files = discover(&options.source_dir)?;
        let source_dir = options
            .source_dir
            .canonicalize()
            .unwrap_or_else(|_| options.source_dir.clone());

        if options.dry_run {
            tracing::info!(count = files.len(), "Dry run; skipping processing");
            return Ok(BatchReport::DryRun { source_dir, files });
        }

        let output_dir = prepare_output_dir(&options.output_dir)?;

        if files.is_empty() {
            return Ok(BatchReport::Completed(BatchSummary::from_results(
                source_dir,
                output_dir,
                Vec::new(),
            )));
        }

        if !self.pipeline.renderer().is_available() {
            return Err(ProxyError::unsupported(format!(
                "Media codec '{}' is not available",
                self.pipeline.renderer().codec_name()
            )));
        }

        let names = plan_output_names(&files);
        let jobs = options.jobs.max(1);

        tracing::info!(
            files = files.len(),
            jobs,
            width = options.target_width,
            output = %output_dir.display(),
            "Starting batch"
        );
        self.progress.begin(files.len() as u64);

        let semaphore = Arc::new(Semaphore::new(jobs));
        let mut handles = Vec::with_capacity(files.len());

        for (file, file_name) in files.iter().zip(names) {
            if self.stop_requested() {
                break;
            }
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| ProxyError::Other(anyhow::Error::new(e)))?;
            // A stop may arrive while waiting for a free slot.
            if self.stop_requested() {
                break;
            }

            let pipeline = self.pipeline.clone();
            let progress = self.progress.clone();
            let file = file.clone();
            let target = RenderTarget {
                output_dir: output_dir.clone(),
                file_name,
                width: options.target_width,
            };

            handles.push(tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let result = pipeline.process(&file, &target, progress.as_ref());
                progress.write_line(&result_line(&file, &result));
                progress.advance(1);
                result
            }));
        }

        let mut results = Vec::with_capacity(files.len());
        for (file, handle) in files.iter().zip(handles) {
            let result = match handle.await {
                Ok(result) => result,
                Err(err) => {
                    tracing::error!(source = %file.path.display(), error = %err, "Worker panicked");
                    ProxyResult::failed(&file.path, format!("worker failed: {err}"))
                }
            };
            results.push(result);
        }
        for file in files.iter().skip(results.len()) {
            results.push(ProxyResult::cancelled(&file.path));
        }

        self.progress.finish();

        let summary = BatchSummary::from_results(source_dir, output_dir, results);
        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Batch complete"
        );
        Ok(BatchReport::Completed(summary))
    }

    fn stop_requested(&self) -> bool {
        self.stop_flag.load(Ordering::SeqCst)
    }
}

fn prepare_output_dir(output_dir: &Path) -> ProxygenResult<PathBuf> {
    std::fs::create_dir_all(output_dir).map_err(|e| {
        ProxyError::config(format!(
            "Cannot create output directory {}: {e}",
            output_dir.display()
        ))
    })?;
    Ok(output_dir.canonicalize()?)
}

fn result_line(file: &VideoFile, result: &ProxyResult) -> String {
    match (result.output_path(), result.reason()) {
        (Some(output), _) => format!(
            "✓ {} -> {}",
            file.relative_path.display(),
            output.display()
        ),
        (None, reason) => format!(
            "✗ {}: {}",
            file.relative_path.display(),
            reason.unwrap_or("unknown error")
        ),
    }
}

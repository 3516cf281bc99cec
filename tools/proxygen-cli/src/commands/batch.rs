//! Run a proxy batch over a source tree.

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Context;
use proxygen_batch::{BatchOptions, BatchOrchestrator, NullProgress, ProgressSink};
use proxygen_common::config::AppConfig;
use proxygen_common::logging::init_logging;
use proxygen_processing_core::clip_select::SeededRandom;
use proxygen_processing_core::metadata::MetadataResolver;
use proxygen_render_engine::codec::{CodecOptions, MediaCodec};
use proxygen_render_engine::ffmpeg::FfmpegCodec;
use proxygen_render_engine::renderer::ProxyRenderer;

use crate::progress::BarProgress;
use crate::report;

/// Command-line overrides layered on top of the config file.
#[derive(Debug, Clone, Default)]
pub struct BatchArgs {
    pub width: Option<u32>,
    pub dry_run: bool,
    pub source_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub seed: Option<u64>,
    pub config: Option<PathBuf>,
    pub json: bool,
    pub verbose: bool,
}

/// Run the batch and return the process exit code.
pub async fn run(args: BatchArgs) -> anyhow::Result<i32> {
    let config = resolve_config(&args)?;
    init_logging(&config.logging)?;

    let mut options = BatchOptions::from_config(&config);
    options.dry_run = args.dry_run;

    let codec = FfmpegCodec::new();
    let resolver = if config.proxy.embedded_metadata && !options.dry_run && codec.is_available()
    {
        MetadataResolver::new(Arc::new(codec.tag_reader()))
    } else {
        MetadataResolver::filesystem_only()
    };
    tracing::debug!(
        embedded_tags = resolver.uses_embedded_tags(),
        "Metadata resolver ready"
    );

    let renderer = ProxyRenderer::new(Arc::new(codec), CodecOptions::from(&config.proxy));
    let progress: Arc<dyn ProgressSink> = if args.json {
        Arc::new(NullProgress)
    } else {
        Arc::new(BarProgress::new())
    };

    let mut orchestrator = BatchOrchestrator::new(renderer, resolver).with_progress(progress);
    if let Some(seed) = args.seed {
        orchestrator = orchestrator.with_random_source(Box::new(SeededRandom::new(seed)));
    }

    let stop = orchestrator.stop_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::warn!("Interrupt received; finishing in-flight renders (press Ctrl+C again to abort)");
        stop.store(true, Ordering::SeqCst);

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });

    if !args.json {
        println!(
            "Searching for video files in: {}",
            options.source_dir.display()
        );
    }

    let report = orchestrator.run(&options).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report::print_report(&report);
    }

    Ok(report.exit_code())
}

/// Load the config file and apply command-line overrides.
pub fn resolve_config(args: &BatchArgs) -> anyhow::Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AppConfig::load(),
    };

    if let Some(dir) = &args.source_dir {
        config.source_dir = dir.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(width) = args.width {
        config.proxy.width = width;
    }
    if let Some(jobs) = args.jobs {
        config.proxy.jobs = jobs;
    }
    if args.verbose {
        config.logging.level = "debug".to_string();
    }
    // A dry run writes nothing, log file included.
    if args.dry_run {
        config.logging.file = None;
    }

    config.validate()?;
    Ok(config)
}

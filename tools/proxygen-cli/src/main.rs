//! Proxygen CLI: build short titled proxies for every video under a directory.
//!
//! Usage:
//!   proxygen [OPTIONS]
//!   proxygen --dry-run --source-dir ./footage
//!   proxygen --source-dir ./footage --output-dir ./proxies --width 480 --jobs 4

use std::path::PathBuf;

use clap::Parser;

mod commands;
mod progress;
mod report;

#[derive(Parser, Debug)]
#[command(
    name = "proxygen",
    about = "Generate short, downscaled, titled proxy clips for a tree of videos",
    version,
    author
)]
struct Cli {
    /// Proxy width in pixels (height follows the source aspect ratio)
    #[arg(long)]
    width: Option<u32>,

    /// List the files that would be processed and exit
    #[arg(long)]
    dry_run: bool,

    /// Directory scanned recursively for videos
    #[arg(long)]
    source_dir: Option<PathBuf>,

    /// Directory proxies are written to (created if absent)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Number of proxies rendered concurrently
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Seed for clip window placement, for repeatable runs
    #[arg(long)]
    seed: Option<u64>,

    /// Config file (defaults to $XDG_CONFIG_HOME/proxygen/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match commands::batch::run(commands::batch::BatchArgs {
        width: cli.width,
        dry_run: cli.dry_run,
        source_dir: cli.source_dir,
        output_dir: cli.output_dir,
        jobs: cli.jobs,
        seed: cli.seed,
        config: cli.config,
        json: cli.json,
        verbose: cli.verbose,
    })
    .await
    {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", report::describe_error(&e));
            1
        }
    };

    std::process::exit(code);
}

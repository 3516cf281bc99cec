//! Logging and tracing initialization.

use std::sync::Mutex;

use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::config::LoggingConfig;
use crate::error::ProxygenResult;

/// Initialize the tracing subscriber with the given configuration.
///
/// Logs go to stderr (stdout carries the run report) unless a log file is
/// configured. `RUST_LOG` overrides the configured level.
pub fn init_logging(config: &LoggingConfig) -> ProxygenResult<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let writer = match &config.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    if config.json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(writer)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(writer)
            .with_ansi(config.file.is_none())
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }

    Ok(())
}

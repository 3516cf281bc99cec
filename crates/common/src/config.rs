//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ProxyError, ProxygenResult};

/// Smallest proxy width accepted by the encoder settings.
pub const MIN_PROXY_WIDTH: u32 = 16;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root directory scanned for source videos.
    pub source_dir: PathBuf,

    /// Flat directory receiving the rendered proxies.
    pub output_dir: PathBuf,

    /// Proxy rendering defaults.
    pub proxy: ProxyDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default proxy rendering parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyDefaults {
    /// Target proxy width in pixels. Height follows the source aspect ratio.
    pub width: u32,

    /// Number of files rendered concurrently. `1` processes strictly in order.
    pub jobs: usize,

    /// ffmpeg video encoder.
    pub video_codec: String,

    /// ffmpeg audio encoder.
    pub audio_codec: String,

    /// Encoder preset passed to the video codec.
    pub preset: String,

    /// Read container tags (creation time, GPS location) before falling
    /// back to filesystem and filename heuristics.
    pub embedded_metadata: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "proxygen=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path. Logs go to stderr when unset.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("/testdata"),
            output_dir: PathBuf::from("/video_clip_proxies"),
            proxy: ProxyDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ProxyDefaults {
    fn default() -> Self {
        Self {
            width: 640,
            jobs: 1,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            preset: "medium".to_string(),
            embedded_metadata: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_or_default(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load_or_default(config_path: &Path) -> Self {
        if config_path.exists() {
            match Self::load_from(config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Parse a config file, propagating read and parse errors.
    pub fn load_from(config_path: &Path) -> ProxygenResult<Self> {
        let content = std::fs::read_to_string(config_path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Reject settings the render pipeline cannot honor.
    pub fn validate(&self) -> ProxygenResult<()> {
        if self.proxy.width < MIN_PROXY_WIDTH {
            return Err(ProxyError::config(format!(
                "proxy width must be at least {MIN_PROXY_WIDTH}, got {}",
                self.proxy.width
            )));
        }
        if self.proxy.width % 2 != 0 {
            return Err(ProxyError::config(format!(
                "proxy width must be even for yuv420p output, got {}",
                self.proxy.width
            )));
        }
        if self.proxy.jobs == 0 {
            return Err(ProxyError::config("jobs must be at least 1"));
        }
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("proxygen").join("config.json")
}

//! Media codec boundary.
//!
//! Decoding, scaling, overlay compositing, and encoding are delegated to an
//! external codec. The pipeline only talks to it through [`MediaCodec`].

use std::path::{Path, PathBuf};

use proxygen_common::config::ProxyDefaults;
use proxygen_common::error::ProxygenResult;

use crate::compositor::TitleLayer;

/// Stream properties needed to plan a proxy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaInfo {
    /// Container duration in seconds.
    pub duration_secs: f64,
    /// Width of the first video stream.
    pub width: u32,
    /// Height of the first video stream.
    pub height: u32,
}

/// Encoder settings applied to every proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecOptions {
    pub video_codec: String,
    pub audio_codec: String,
    pub preset: String,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self::from(&ProxyDefaults::default())
    }
}

impl From<&ProxyDefaults> for CodecOptions {
    fn from(defaults: &ProxyDefaults) -> Self {
        Self {
            video_codec: defaults.video_codec.clone(),
            audio_codec: defaults.audio_codec.clone(),
            preset: defaults.preset.clone(),
        }
    }
}

/// One fully planned render.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Source video.
    pub source: PathBuf,
    /// Offset of the extracted range (seconds).
    pub start_secs: f64,
    /// Forced output duration (seconds).
    pub duration_secs: f64,
    /// Scaled frame width.
    pub width: u32,
    /// Scaled frame height.
    pub height: u32,
    /// Text layer composited on top of the scaled frames.
    pub overlay: TitleLayer,
    /// Where the encoded file is written.
    pub output_path: PathBuf,
    /// Encoder settings.
    pub options: CodecOptions,
}

/// External codec used to probe and render proxies.
pub trait MediaCodec: Send + Sync {
    /// Read duration and frame size of a source.
    fn probe(&self, path: &Path) -> ProxygenResult<MediaInfo>;

    /// Extract, scale, overlay, and encode one proxy.
    fn render(&self, request: &RenderRequest) -> ProxygenResult<()>;

    /// Check if this codec is usable on the system.
    fn is_available(&self) -> bool;

    /// Codec name.
    fn name(&self) -> &str;
}

//! Proxy rendering adaptor.
//!
//! Plans one render (range, frame size, overlay), hands it to the codec,
//! and converts every failure into a failed [`ProxyResult`] so a bad file
//! never aborts the batch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use proxygen_common::error::{ProxyError, ProxygenResult};
use proxygen_media_model::clip::ClipWindow;
use proxygen_media_model::result::ProxyResult;
use proxygen_media_model::title_card::TitleCard;
use proxygen_media_model::video::VideoFile;
use proxygen_processing_core::naming::PROXY_CONTAINER_EXT;

use crate::codec::{CodecOptions, MediaCodec, MediaInfo, RenderRequest};
use crate::compositor::{target_height, TitleLayer};

/// Where and how large a proxy is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTarget {
    /// Flat output directory.
    pub output_dir: PathBuf,
    /// Planned output file name.
    pub file_name: String,
    /// Proxy width in pixels.
    pub width: u32,
}

impl RenderTarget {
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.file_name)
    }
}

/// Renders proxies through a [`MediaCodec`].
#[derive(Clone)]
pub struct ProxyRenderer {
    codec: Arc<dyn MediaCodec>,
    options: CodecOptions,
}

impl ProxyRenderer {
    pub fn new(codec: Arc<dyn MediaCodec>, options: CodecOptions) -> Self {
        Self { codec, options }
    }

    /// Name of the underlying codec.
    pub fn codec_name(&self) -> &str {
        self.codec.name()
    }

    /// Whether the underlying codec can run.
    pub fn is_available(&self) -> bool {
        self.codec.is_available()
    }

    /// Read duration and frame size of a source.
    pub fn probe(&self, file: &VideoFile) -> ProxygenResult<MediaInfo> {
        self.codec.probe(&file.path)
    }

    /// Render one proxy. Never returns an error; failures become a failed
    /// result and leave nothing at the final path.
    pub fn render(
        &self,
        file: &VideoFile,
        source: &MediaInfo,
        window: &ClipWindow,
        card: &TitleCard,
        target: &RenderTarget,
    ) -> ProxyResult {
        match self.try_render(file, source, window, card, target) {
            Ok(output_path) => {
                tracing::info!(
                    source = %file.path.display(),
                    output = %output_path.display(),
                    "Proxy rendered"
                );
                ProxyResult::rendered(&file.path, output_path)
            }
            Err(err) => {
                tracing::warn!(source = %file.path.display(), error = %err, "Proxy render failed");
                ProxyResult::failed(&file.path, err.to_string())
            }
        }
    }

    fn try_render(
        &self,
        file: &VideoFile,
        source: &MediaInfo,
        window: &ClipWindow,
        card: &TitleCard,
        target: &RenderTarget,
    ) -> ProxygenResult<PathBuf> {
        if source.width == 0 || source.height == 0 {
            return Err(ProxyError::render("Source reports an empty frame size"));
        }

        let final_path = target.output_path();
        let staging = staging_path(&target.output_dir)?;

        let request = RenderRequest {
            source: file.path.clone(),
            start_secs: window.start_secs,
            duration_secs: window.duration_secs,
            width: target.width,
            height: target_height(source.width, source.height, target.width),
            overlay: TitleLayer::from_card(card),
            output_path: staging.to_path_buf(),
            options: self.options.clone(),
        };

        tracing::debug!(
            source = %file.path.display(),
            start_secs = window.start_secs,
            width = request.width,
            height = request.height,
            codec = self.codec.name(),
            "Rendering proxy"
        );

        self.codec.render(&request)?;

        // Rename only after a successful encode; dropping `staging` on the
        // error paths removes the partial file.
        staging
            .persist(&final_path)
            .map_err(|e| ProxyError::render(format!("Failed to move proxy into place: {}", e.error)))?;

        Ok(final_path)
    }
}

/// Reserve a hidden temporary file next to the final output so the final
/// rename stays on one filesystem.
fn staging_path(output_dir: &Path) -> ProxygenResult<tempfile::TempPath> {
    let file = tempfile::Builder::new()
        .prefix(".proxygen-")
        .suffix(&format!(".partial.{PROXY_CONTAINER_EXT}"))
        .tempfile_in(output_dir)
        .map_err(|e| {
            ProxyError::render(format!(
                "Failed to create staging file in {}: {e}",
                output_dir.display()
            ))
        })?;
    Ok(file.into_temp_path())
}

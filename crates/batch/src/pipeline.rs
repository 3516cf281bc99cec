//! Per-file proxy pipeline.

use std::sync::{Arc, Mutex, PoisonError};

use proxygen_media_model::clip::ClipSelection;
use proxygen_media_model::result::ProxyResult;
use proxygen_media_model::video::VideoFile;
use proxygen_processing_core::clip_select::{ClipSelector, RandomSource, ThreadRandom};
use proxygen_processing_core::metadata::MetadataResolver;
use proxygen_processing_core::title_card::TitleCardComposer;
use proxygen_render_engine::renderer::{ProxyRenderer, RenderTarget};

use crate::progress::ProgressSink;

/// Stages a file moves through.
///
/// `Rendered`, `Rejected`, and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStage {
    Discovered,
    MetadataResolved,
    WindowSelected,
    Rejected,
    Rendered,
    Failed,
}

impl FileStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::MetadataResolved => "metadata_resolved",
            Self::WindowSelected => "window_selected",
            Self::Rejected => "rejected",
            Self::Rendered => "rendered",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Rendered | Self::Failed)
    }
}

/// Everything needed to take one file from discovery to a result.
///
/// Cheap to clone; clones share the codec and the random source.
#[derive(Clone)]
pub struct FilePipeline {
    resolver: MetadataResolver,
    selector: ClipSelector,
    composer: TitleCardComposer,
    renderer: ProxyRenderer,
    rng: Arc<Mutex<Box<dyn RandomSource>>>,
}

impl FilePipeline {
    pub fn new(renderer: ProxyRenderer, resolver: MetadataResolver) -> Self {
        Self {
            resolver,
            selector: ClipSelector::new(),
            composer: TitleCardComposer::default(),
            renderer,
            rng: Arc::new(Mutex::new(Box::new(ThreadRandom))),
        }
    }

    /// Replace the window placement randomness (e.g. a seeded source).
    pub fn with_random_source(mut self, rng: Box<dyn RandomSource>) -> Self {
        self.rng = Arc::new(Mutex::new(rng));
        self
    }

    pub fn renderer(&self) -> &ProxyRenderer {
        &self.renderer
    }

    /// Run one file to a terminal stage. Never fails; every problem is
    /// reported in the returned result.
    pub fn process(
        &self,
        file: &VideoFile,
        target: &RenderTarget,
        progress: &dyn ProgressSink,
    ) -> ProxyResult {
        let name = file.file_name();
        transition(file, FileStage::Discovered);

        progress.set_label(&format!("Processing: {name}"));
        let metadata = self.resolver.resolve(file);
        transition(file, FileStage::MetadataResolved);

        let info = match self.renderer.probe(file) {
            Ok(info) => info,
            Err(err) => {
                transition(file, FileStage::Failed);
                return ProxyResult::failed(&file.path, err.to_string());
            }
        };

        let selection = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            self.selector.select(info.duration_secs, rng.as_mut())
        };
        let window = match selection {
            ClipSelection::Window(window) => window,
            ClipSelection::Rejected { reason } => {
                tracing::info!(
                    source = %file.path.display(),
                    duration_secs = info.duration_secs,
                    reason = %reason,
                    "Clip rejected"
                );
                transition(file, FileStage::Rejected);
                return ProxyResult::rejected(&file.path, reason);
            }
        };
        transition(file, FileStage::WindowSelected);

        progress.set_label(&format!("Rendering: {name}"));
        let card = self.composer.compose(&metadata);
        let result = self.renderer.render(file, &info, &window, &card, target);

        transition(
            file,
            if result.success() {
                FileStage::Rendered
            } else {
                FileStage::Failed
            },
        );
        result
    }
}

fn transition(file: &VideoFile, stage: FileStage) {
    tracing::debug!(
        source = %file.path.display(),
        stage = stage.as_str(),
        terminal = stage.is_terminal(),
        "File stage"
    );
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assets::decode::{DecodeIngestor, ImageIngestor, IngestOpts};
use crate::encode::png::{DEFAULT_EXPORT_FILE_NAME, encode_png};
use crate::encode::sink::{DirectorySink, ExportSink};
use crate::extract::SubjectExtractor;
use crate::foundation::core::LayerId;
use crate::foundation::error::{TexturaError, TexturaResult};
use crate::layers::controls::StyleControl;
use crate::layers::store::LayerStore;
use crate::layers::style::{LayerUpdate, TextLayerStyle};
use crate::pipeline::processing::{
    Generation, PipelineEvent, PipelineOpts, ProcessingPipeline, ProcessingState,
};
use crate::render::compositor::{Compositor, CompositorOpts};
use crate::render::frame::RenderedFrame;

/// Options controlling a [`Studio`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StudioOpts {
    /// Output density.
    pub compositor: CompositorOpts,
    /// Upload limits and viewport used by the default ingestor.
    pub ingest: IngestOpts,
    /// Worker threads and supersede policy.
    pub pipeline: PipelineOpts,
}

impl StudioOpts {
    /// Defaults, with the pixel ratio taken from `TEXTURA_DEVICE_PIXEL_RATIO` when set.
    pub fn from_env() -> Self {
        Self {
            compositor: CompositorOpts::from_env(),
            ..Self::default()
        }
    }

    /// Return options with different compositor settings.
    pub fn with_compositor(mut self, compositor: CompositorOpts) -> Self {
        self.compositor = compositor;
        self
    }

    /// Return options with different ingestion limits.
    pub fn with_ingest(mut self, ingest: IngestOpts) -> Self {
        self.ingest = ingest;
        self
    }

    /// Return options with different pipeline settings.
    pub fn with_pipeline(mut self, pipeline: PipelineOpts) -> Self {
        self.pipeline = pipeline;
        self
    }
}

/// Owner of the layer store, compositor and processing pipeline.
///
/// All mutation and rendering happen on the thread that owns the studio; only ingestion and
/// extraction run elsewhere. Layer mutations mark the frame stale, and [`Studio::frame`] renders
/// at most once per batch of mutations.
#[derive(Debug)]
pub struct Studio {
    store: LayerStore,
    compositor: Compositor,
    pipeline: ProcessingPipeline,
    frame: Option<RenderedFrame>,
    rendered_revision: Option<u64>,
    render_count: u64,
}

impl Studio {
    /// Create a studio that decodes uploads with [`DecodeIngestor`].
    pub fn new(extractor: Arc<dyn SubjectExtractor>, opts: StudioOpts) -> TexturaResult<Self> {
        let ingestor = Arc::new(DecodeIngestor::new(opts.ingest));
        Self::with_ingestor(ingestor, extractor, opts)
    }

    /// Create a studio with custom adapters.
    pub fn with_ingestor(
        ingestor: Arc<dyn ImageIngestor>,
        extractor: Arc<dyn SubjectExtractor>,
        opts: StudioOpts,
    ) -> TexturaResult<Self> {
        Ok(Self {
            store: LayerStore::new(),
            compositor: Compositor::new(opts.compositor),
            pipeline: ProcessingPipeline::new(ingestor, extractor, opts.pipeline)?,
            frame: None,
            rendered_revision: None,
            render_count: 0,
        })
    }

    /// Read-only view of the layer store.
    pub fn store(&self) -> &LayerStore {
        &self.store
    }

    /// Layers in paint order.
    pub fn layers(&self) -> &[TextLayerStyle] {
        self.store.layers()
    }

    /// The layer being edited.
    pub fn selected_layer(&self) -> &TextLayerStyle {
        self.store.selected_layer()
    }

    /// See [`LayerStore::add_layer`].
    pub fn add_layer(&mut self) -> LayerId {
        self.store.add_layer()
    }

    /// See [`LayerStore::remove_layer`].
    pub fn remove_layer(&mut self, id: LayerId) -> bool {
        self.store.remove_layer(id)
    }

    /// See [`LayerStore::update_layer`].
    pub fn update_layer(&mut self, id: LayerId, update: &LayerUpdate) -> bool {
        self.store.update_layer(id, update)
    }

    /// Apply a camelCase JSON patch (`{"opacity": 0.3}`) to a layer. Numeric fields are clamped
    /// into range first.
    pub fn update_layer_json(&mut self, id: LayerId, json: &str) -> TexturaResult<bool> {
        let update = LayerUpdate::from_json(json)?.clamped();
        Ok(self.store.update_layer(id, &update))
    }

    /// Move a numeric control of the selected layer; the value is clamped first.
    pub fn set_control(&mut self, control: StyleControl, value: f64) -> bool {
        let id = self.store.selected_id();
        self.store.update_layer(id, &control.update(value).clamped())
    }

    /// See [`LayerStore::select`].
    pub fn select(&mut self, id: LayerId) -> bool {
        self.store.select(id)
    }

    /// Register extra font data for text layers. Returns the family names it provides.
    pub fn register_font(&mut self, font_bytes: &[u8]) -> TexturaResult<Vec<String>> {
        let names = self.compositor.register_font(font_bytes)?;
        self.rendered_revision = None;
        Ok(names)
    }

    /// Start processing an upload. Returns immediately.
    pub fn submit_upload(&mut self, bytes: Vec<u8>) -> Generation {
        self.pipeline.submit(bytes)
    }

    /// Apply any finished uploads without blocking and return the resulting state.
    pub fn poll_processing(&mut self) -> ProcessingState {
        let events = self.pipeline.poll();
        self.apply_events(events);
        self.pipeline.state()
    }

    /// Block until every submitted upload has finished, then return the resulting state.
    pub fn wait_for_processing(&mut self) -> ProcessingState {
        let events = self.pipeline.wait();
        self.apply_events(events);
        self.pipeline.state()
    }

    /// Current loading indicator state.
    pub fn processing_state(&self) -> ProcessingState {
        self.pipeline.state()
    }

    /// `true` while an upload is being processed.
    pub fn is_loading(&self) -> bool {
        self.pipeline.state().is_loading()
    }

    /// Current frame, re-rendered first if anything changed since the last render.
    ///
    /// Returns `None` until an upload has been processed.
    pub fn frame(&mut self) -> TexturaResult<Option<&RenderedFrame>> {
        let revision = self.store.revision();
        if self.rendered_revision != Some(revision) {
            if let Some(frame) = self.compositor.render_store(&self.store)? {
                self.frame = Some(frame);
                self.render_count += 1;
            }
            self.rendered_revision = Some(revision);
        } else {
            tracing::trace!(revision, "frame is current");
        }
        Ok(self.frame.as_ref())
    }

    /// Number of renders performed so far.
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    /// `true` once a frame exists that could be exported.
    pub fn can_export(&self) -> bool {
        self.store.processed_images().is_some()
    }

    /// Encode the current full-resolution frame as PNG.
    pub fn export_png(&mut self) -> TexturaResult<Vec<u8>> {
        let Some(frame) = self.frame()? else {
            return Err(TexturaError::export("nothing has been rendered yet"));
        };
        encode_png(frame)
    }

    /// Hand the PNG export to `sink` under [`DEFAULT_EXPORT_FILE_NAME`].
    pub fn export_to(&mut self, sink: &mut dyn ExportSink) -> TexturaResult<()> {
        let bytes = self.export_png()?;
        sink.save(DEFAULT_EXPORT_FILE_NAME, &bytes)
    }

    /// Write the PNG export into `dir`. Returns the written path.
    pub fn save_export(&mut self, dir: impl AsRef<Path>) -> TexturaResult<PathBuf> {
        let mut sink = DirectorySink::new(dir.as_ref());
        self.export_to(&mut sink)?;
        Ok(dir.as_ref().join(DEFAULT_EXPORT_FILE_NAME))
    }

    fn apply_events(&mut self, events: Vec<PipelineEvent>) {
        for ev in events {
            if let PipelineEvent::Ready(generation, images) = ev {
                tracing::debug!(%generation, "storing processed images");
                self.store.set_processed_images(images);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/studio.rs"]
mod tests;

//! Textura composites text *behind* the subject of a photo.
//!
//! An upload is decoded and normalized, a pluggable extractor cuts the subject out, and every
//! frame is drawn as three bands: the opaque original, the text layers in list order, then the
//! subject cutout on top. The public API is session-oriented:
//!
//! - Create a [`Studio`] with a [`SubjectExtractor`]
//! - Submit uploads and poll for completion
//! - Edit text layers, read the current [`RenderedFrame`], export it as PNG
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Upload decoding and raster types.
pub mod assets;
/// Lossless export.
pub mod encode;
/// Subject extraction boundary.
pub mod extract;
/// Text layers, controls and the layer store.
pub mod layers;
/// Off-thread upload processing.
pub mod pipeline;
/// Compositing.
pub mod render;
/// Session-oriented API.
pub mod session;

pub use crate::foundation::core::{Affine, LayerId, LogicalSize, Point, Rgb8, Rgba8Premul, Vec2};
pub use crate::foundation::error::{TexturaError, TexturaResult};

pub use crate::assets::decode::{
    DecodeIngestor, ImageIngestor, IngestOpts, MAX_SOURCE_DIMENSION, MAX_UPLOAD_BYTES, Viewport,
};
pub use crate::assets::raster::Raster;
pub use crate::assets::text::{FALLBACK_FAMILIES, GENERIC_FAMILY, font_stack_source};
pub use crate::encode::png::{DEFAULT_EXPORT_FILE_NAME, encode_png};
pub use crate::encode::sink::{DirectorySink, ExportSink, InMemoryExportSink};
pub use crate::extract::SubjectExtractor;
pub use crate::layers::controls::{StyleControl, color_update, font_family_update, text_update};
pub use crate::layers::store::{LayerStore, ProcessedImageSet};
pub use crate::layers::style::{LayerUpdate, TextLayerStyle};
pub use crate::pipeline::processing::{
    Generation, PipelineEvent, PipelineOpts, ProcessingPipeline, ProcessingState, SupersedePolicy,
};
pub use crate::render::compositor::{Compositor, CompositorOpts};
pub use crate::render::frame::RenderedFrame;
pub use crate::render::geometry::{LayerGeometry, layer_geometry};
pub use crate::session::studio::{Studio, StudioOpts};

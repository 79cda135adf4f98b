//! Source image ingestion, premultiplied rasters and text shaping.

/// Upload decoding, orientation and viewport fitting.
pub mod decode;
/// Premultiplied RGBA8 rasters.
pub mod raster;
pub(crate) mod text;

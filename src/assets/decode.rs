use std::io::Cursor;

use anyhow::Context;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder};

use crate::assets::raster::Raster;
use crate::foundation::error::{TexturaError, TexturaResult};
use crate::foundation::math::{fit_scale, scaled_dims_floor};

/// Uploads larger than this are rejected before decoding.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Sources wider or taller than this are downsampled before anything else happens.
pub const MAX_SOURCE_DIMENSION: u32 = 4096;

/// Area available for the working image, in logical pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    /// Maximum logical width.
    pub max_width: u32,
    /// Maximum logical height.
    pub max_height: u32,
}

impl Viewport {
    /// Upper bound on the working width regardless of container size.
    pub const CAP_WIDTH: u32 = 800;
    /// Upper bound on the working height regardless of container size.
    pub const CAP_HEIGHT: u32 = 600;

    /// Fit area derived from a container's client size, capped at 800x600.
    pub fn from_container(width: u32, height: u32) -> Self {
        Self {
            max_width: width.clamp(1, Self::CAP_WIDTH),
            max_height: height.clamp(1, Self::CAP_HEIGHT),
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::from_container(Self::CAP_WIDTH, Self::CAP_HEIGHT)
    }
}

/// Ingestion limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IngestOpts {
    /// Size ceiling for raw upload bytes.
    pub max_upload_bytes: usize,
    /// Longest allowed source side before downsampling.
    pub max_dimension: u32,
    /// Area the normalized image must fit into.
    pub viewport: Viewport,
}

impl Default for IngestOpts {
    fn default() -> Self {
        Self {
            max_upload_bytes: MAX_UPLOAD_BYTES,
            max_dimension: MAX_SOURCE_DIMENSION,
            viewport: Viewport::default(),
        }
    }
}

impl IngestOpts {
    /// Return options with a different fit area.
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }
}

/// Turns raw upload bytes into a normalized, fully opaque raster.
pub trait ImageIngestor: Send + Sync {
    /// Decode and normalize `bytes`.
    fn ingest(&self, bytes: &[u8]) -> TexturaResult<Raster>;
}

/// Default ingestor backed by the `image` crate decoders.
///
/// Steps: size ceiling, decode with EXIF orientation applied, downsample to
/// [`IngestOpts::max_dimension`], fit into [`IngestOpts::viewport`], flatten alpha.
#[derive(Clone, Copy, Debug, Default)]
pub struct DecodeIngestor {
    opts: IngestOpts,
}

impl DecodeIngestor {
    /// Create an ingestor with explicit limits.
    pub fn new(opts: IngestOpts) -> Self {
        Self { opts }
    }

    /// Limits in effect.
    pub fn opts(&self) -> IngestOpts {
        self.opts
    }
}

impl ImageIngestor for DecodeIngestor {
    #[tracing::instrument(skip_all, fields(bytes = bytes.len()))]
    fn ingest(&self, bytes: &[u8]) -> TexturaResult<Raster> {
        if bytes.len() > self.opts.max_upload_bytes {
            return Err(TexturaError::ingestion(format!(
                "upload of {} bytes exceeds the {} byte limit",
                bytes.len(),
                self.opts.max_upload_bytes
            )));
        }

        let img = decode_oriented(bytes)
            .map_err(|e| TexturaError::ingestion(format!("{e:#}")))?;
        let (src_w, src_h) = (img.width(), img.height());

        let max = self.opts.max_dimension;
        let img = resize_by(img, fit_scale(src_w, src_h, max, max));

        let vp = self.opts.viewport;
        let (mid_w, mid_h) = (img.width(), img.height());
        let img = resize_by(img, fit_scale(mid_w, mid_h, vp.max_width, vp.max_height));

        tracing::debug!(
            src_w,
            src_h,
            out_w = img.width(),
            out_h = img.height(),
            "normalized upload"
        );
        Ok(Raster::from_rgba_image(img.to_rgba8())?.flattened())
    }
}

fn decode_oriented(bytes: &[u8]) -> anyhow::Result<DynamicImage> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("sniff image format")?;
    let mut decoder = reader.into_decoder().context("open image decoder")?;
    let orientation = decoder
        .orientation()
        .unwrap_or(image::metadata::Orientation::NoTransforms);
    let mut img = DynamicImage::from_decoder(decoder).context("decode image")?;
    img.apply_orientation(orientation);
    Ok(img)
}

fn resize_by(img: DynamicImage, scale: f64) -> DynamicImage {
    if scale >= 1.0 {
        return img;
    }
    let (w, h) = scaled_dims_floor(img.width(), img.height(), scale);
    img.resize_exact(w, h, FilterType::Lanczos3)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;

use std::sync::Arc;

use crate::foundation::core::{LogicalSize, Rgba8Premul, premul_channel, unpremul_channel};
use crate::foundation::error::{TexturaError, TexturaResult};

/// Immutable raster in premultiplied RGBA8, row-major, tightly packed.
///
/// Pixel storage is shared: cloning a `Raster` is cheap and never copies pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    rgba8_premul: Arc<Vec<u8>>,
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba8_premul.len())
            .finish()
    }
}

impl Raster {
    /// Wrap premultiplied RGBA8 bytes.
    pub fn from_premul_rgba8(width: u32, height: u32, data: Vec<u8>) -> TexturaResult<Self> {
        if width == 0 || height == 0 {
            return Err(TexturaError::validation("raster dimensions must be non-zero"));
        }
        let expected = (width as usize) * (height as usize) * 4;
        if data.len() != expected {
            return Err(TexturaError::validation(format!(
                "raster byte length mismatch: expected {expected}, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(data),
        })
    }

    /// Build from straight-alpha RGBA8 bytes, premultiplying in place.
    pub fn from_straight_rgba8(width: u32, height: u32, mut data: Vec<u8>) -> TexturaResult<Self> {
        premultiply_rgba8_in_place(&mut data);
        Self::from_premul_rgba8(width, height, data)
    }

    /// Build from a decoded `image` buffer.
    pub fn from_rgba_image(img: image::RgbaImage) -> TexturaResult<Self> {
        let (width, height) = img.dimensions();
        Self::from_straight_rgba8(width, height, img.into_raw())
    }

    /// Fill a raster with one straight-alpha color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> TexturaResult<Self> {
        let px = Rgba8Premul::from_straight_rgba(rgba[0], rgba[1], rgba[2], rgba[3]);
        let n = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(n * 4);
        for _ in 0..n {
            data.extend_from_slice(&[px.r, px.g, px.b, px.a]);
        }
        Self::from_premul_rgba8(width, height, data)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Dimensions as a [`LogicalSize`].
    pub fn size(&self) -> LogicalSize {
        LogicalSize {
            width: self.width,
            height: self.height,
        }
    }

    /// Premultiplied RGBA8 bytes.
    pub fn premul_bytes(&self) -> &[u8] {
        self.rgba8_premul.as_slice()
    }

    /// Premultiplied pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8Premul> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = &self.rgba8_premul[i..i + 4];
        Some(Rgba8Premul {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        })
    }

    /// `true` when both rasters are views of the same pixel storage.
    pub(crate) fn shares_pixels(&self, other: &Raster) -> bool {
        Arc::ptr_eq(&self.rgba8_premul, &other.rgba8_premul)
    }

    /// `true` when every pixel has alpha 255.
    pub fn is_opaque(&self) -> bool {
        self.rgba8_premul.chunks_exact(4).all(|px| px[3] == 255)
    }

    /// Return a fully opaque copy, compositing translucent pixels over black.
    ///
    /// Premultiplied color over black is the premultiplied color itself, so only alpha changes.
    pub fn flattened(&self) -> Self {
        if self.is_opaque() {
            return self.clone();
        }
        let mut data = self.rgba8_premul.as_ref().clone();
        for px in data.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Self {
            width: self.width,
            height: self.height,
            rgba8_premul: Arc::new(data),
        }
    }

    /// Convert to a straight-alpha `image` buffer.
    pub fn to_rgba_image(&self) -> TexturaResult<image::RgbaImage> {
        let mut data = self.rgba8_premul.as_ref().clone();
        unpremultiply_rgba8_in_place(&mut data);
        image::RgbaImage::from_raw(self.width, self.height, data)
            .ok_or_else(|| TexturaError::validation("raster buffer does not match its dimensions"))
    }
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3];
        if a == 255 {
            continue;
        }
        px[0] = premul_channel(px[0], a);
        px[1] = premul_channel(px[1], a);
        px[2] = premul_channel(px[2], a);
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3];
        if a == 255 {
            continue;
        }
        px[0] = unpremul_channel(px[0], a);
        px[1] = unpremul_channel(px[1], a);
        px[2] = unpremul_channel(px[2], a);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/raster.rs"]
mod tests;

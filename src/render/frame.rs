use crate::assets::raster::unpremultiply_rgba8_in_place;
use crate::foundation::core::{LogicalSize, Rgba8Premul};
use crate::foundation::error::{TexturaError, TexturaResult};
use crate::foundation::math::Fnv1a64;

/// A composited frame as RGBA8 pixels at physical (device) resolution.
///
/// `data` is **premultiplied alpha**, row-major, tightly packed. `width`/`height` are
/// `logical` scaled by `density`.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedFrame {
    /// Physical width in pixels.
    pub width: u32,
    /// Physical height in pixels.
    pub height: u32,
    /// Unscaled dimensions the layers were positioned against.
    pub logical: LogicalSize,
    /// Device pixels per logical pixel.
    pub density: f32,
    /// Premultiplied RGBA8 bytes.
    pub data: Vec<u8>,
}

impl RenderedFrame {
    /// Pixel at physical coordinates, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8Premul> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(i..i + 4)?;
        Some(Rgba8Premul {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        })
    }

    /// Pixel at the physical position covering logical point `(x, y)`.
    pub fn pixel_at_logical(&self, x: f64, y: f64) -> Option<Rgba8Premul> {
        if !(x.is_finite() && y.is_finite()) || x < 0.0 || y < 0.0 {
            return None;
        }
        let d = f64::from(self.density);
        self.pixel((x * d).floor() as u32, (y * d).floor() as u32)
    }

    /// Stable hash over dimensions and pixels.
    pub fn fingerprint(&self) -> u64 {
        let mut h = Fnv1a64::new_default();
        h.write_u32(self.width);
        h.write_u32(self.height);
        h.write_bytes(&self.data);
        h.finish()
    }

    /// Straight-alpha copy suitable for encoding.
    pub fn to_rgba_image(&self) -> TexturaResult<image::RgbaImage> {
        let mut data = self.data.clone();
        unpremultiply_rgba8_in_place(&mut data);
        image::RgbaImage::from_raw(self.width, self.height, data)
            .ok_or_else(|| TexturaError::render("frame buffer does not match its dimensions"))
    }
}

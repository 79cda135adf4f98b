use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::raster::Raster;
use crate::assets::text::{TextBrushRgba8, TextLayoutEngine, TextRunStyle};
use crate::foundation::core::{Affine, LogicalSize};
use crate::foundation::error::{TexturaError, TexturaResult};
use crate::layers::store::{LayerStore, ProcessedImageSet};
use crate::layers::style::TextLayerStyle;
use crate::render::frame::RenderedFrame;
use crate::render::geometry::layer_geometry;

/// Options for the compositor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositorOpts {
    pub(crate) native_pixel_ratio: f32,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self {
            native_pixel_ratio: 1.0,
        }
    }
}

impl CompositorOpts {
    /// Lowest density frames are rendered at.
    pub const MIN_DENSITY: f32 = 2.0;

    /// Read `TEXTURA_DEVICE_PIXEL_RATIO`, falling back to the default when unset or unparsable.
    pub fn from_env() -> Self {
        let native = std::env::var("TEXTURA_DEVICE_PIXEL_RATIO")
            .ok()
            .and_then(|v| v.trim().parse::<f32>().ok())
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(1.0);
        Self::default().with_native_pixel_ratio(native)
    }

    /// Return options with the display's native pixel ratio.
    pub fn with_native_pixel_ratio(mut self, ratio: f32) -> Self {
        self.native_pixel_ratio = ratio;
        self
    }

    /// Native pixel ratio as configured.
    pub fn native_pixel_ratio(&self) -> f32 {
        self.native_pixel_ratio
    }

    /// Device pixels per logical pixel: `max(native, 2)`.
    pub fn density(&self) -> f32 {
        let native = if self.native_pixel_ratio.is_finite() && self.native_pixel_ratio > 0.0 {
            self.native_pixel_ratio
        } else {
            1.0
        };
        native.max(Self::MIN_DENSITY)
    }
}

#[derive(Clone)]
struct ImagePaints {
    original_src: Raster,
    subject_src: Raster,
    original: vello_cpu::Image,
    subject: vello_cpu::Image,
}

/// Three-band compositor: opaque original, then text layers in list order, then the subject
/// cutout on top.
pub struct Compositor {
    opts: CompositorOpts,
    ctx: Option<vello_cpu::RenderContext>,
    text_engine: TextLayoutEngine,
    font_cache: HashMap<(u64, u32), vello_cpu::peniko::FontData>,
    image_cache: Option<ImagePaints>,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(CompositorOpts::default())
    }
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("opts", &self.opts)
            .field("cached_fonts", &self.font_cache.len())
            .finish_non_exhaustive()
    }
}

impl Compositor {
    /// Create a compositor with system fonts available.
    pub fn new(opts: CompositorOpts) -> Self {
        Self {
            opts,
            ctx: None,
            text_engine: TextLayoutEngine::new(),
            font_cache: HashMap::new(),
            image_cache: None,
        }
    }

    /// Options this compositor renders with.
    pub fn opts(&self) -> CompositorOpts {
        self.opts
    }

    /// Register extra font data (TTF/OTF/TTC). Returns the family names it provides.
    pub fn register_font(&mut self, font_bytes: &[u8]) -> TexturaResult<Vec<String>> {
        let names = self.text_engine.register_font(font_bytes)?;
        tracing::debug!(?names, "registered font families");
        Ok(names)
    }

    /// `true` when `family` resolves without falling back.
    pub fn has_font_family(&mut self, family: &str) -> bool {
        self.text_engine.has_family(family)
    }

    /// `true` when at least one font in the fallback chain can shape text.
    pub fn has_text_fonts(&mut self) -> bool {
        self.text_engine.has_any_font()
    }

    /// Render the store's current state. Returns `None` when no images have been processed yet.
    pub fn render_store(&mut self, store: &LayerStore) -> TexturaResult<Option<RenderedFrame>> {
        let Some(images) = store.processed_images() else {
            return Ok(None);
        };
        self.render(images, store.layers()).map(Some)
    }

    /// Composite `images` and `layers` into a frame at the configured density.
    #[tracing::instrument(skip_all, fields(
        width = images.size().width,
        height = images.size().height,
        layers = layers.len()
    ))]
    pub fn render(
        &mut self,
        images: &ProcessedImageSet,
        layers: &[TextLayerStyle],
    ) -> TexturaResult<RenderedFrame> {
        let logical = images.size();
        let density = self.opts.density();
        let (width, height) = physical_size(logical, density)?;
        let paints = self.image_paints_for(images)?;

        let w16 = width as u16;
        let h16 = height as u16;
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w16 && ctx.height() == h16 => ctx,
            _ => vello_cpu::RenderContext::new(w16, h16),
        };
        ctx.reset();

        let out = self.draw_bands(&mut ctx, &paints, layers, logical, density);
        let data = out.map(|()| {
            let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
            ctx.flush();
            ctx.render_to_pixmap(&mut pixmap);
            pixmap.data_as_u8_slice().to_vec()
        });
        self.ctx = Some(ctx);

        Ok(RenderedFrame {
            width,
            height,
            logical,
            density,
            data: data?,
        })
    }

    fn draw_bands(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        paints: &ImagePaints,
        layers: &[TextLayerStyle],
        logical: LogicalSize,
        density: f32,
    ) -> TexturaResult<()> {
        let device = Affine::scale(f64::from(density));
        let full = vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(logical.width),
            f64::from(logical.height),
        );

        ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(affine_to_cpu(device));
        ctx.set_paint(paints.original.clone());
        ctx.fill_rect(&full);

        for layer in layers {
            self.draw_text_layer(ctx, layer, logical, device)?;
        }

        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(affine_to_cpu(device));
        ctx.set_paint(paints.subject.clone());
        ctx.fill_rect(&full);
        Ok(())
    }

    fn draw_text_layer(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        layer: &TextLayerStyle,
        logical: LogicalSize,
        device: Affine,
    ) -> TexturaResult<()> {
        if layer.text.is_empty() {
            return Ok(());
        }
        let alpha = layer.fill_alpha();
        if alpha == 0 {
            return Ok(());
        }

        let geom = layer_geometry(layer, logical);
        if !(geom.font_px.is_finite() && geom.font_px > 0.0) {
            tracing::warn!(
                layer = ?layer.id,
                font_px = geom.font_px,
                "skipping layer with unusable font size"
            );
            return Ok(());
        }
        let style = TextRunStyle {
            family: &layer.font_family,
            weight: layer.font_weight,
            size_px: geom.font_px as f32,
            letter_spacing_px: layer.letter_spacing as f32,
            brush: TextBrushRgba8 {
                r: layer.color.r,
                g: layer.color.g,
                b: layer.color.b,
                a: alpha,
            },
        };
        let layout = self.text_engine.layout(&layer.text, &style)?;
        let local = geom.text_transform(f64::from(layout.width()), f64::from(layout.height()));

        // The transform is set per layer, so nothing carries over to the next one.
        ctx.set_transform(affine_to_cpu(device * local));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let font_ref = run.run().font();
                let font = self.font_data_for(font_ref.data.id(), font_ref.index, || {
                    font_ref.data.data().to_vec()
                });
                let glyphs: Vec<vello_cpu::Glyph> = run
                    .positioned_glyphs()
                    .map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    })
                    .collect();
                ctx.glyph_run(&font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs.into_iter());
            }
        }
        Ok(())
    }

    fn font_data_for(
        &mut self,
        blob_id: u64,
        index: u32,
        bytes: impl FnOnce() -> Vec<u8>,
    ) -> vello_cpu::peniko::FontData {
        self.font_cache
            .entry((blob_id, index))
            .or_insert_with(|| {
                vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes()), index)
            })
            .clone()
    }

    fn image_paints_for(&mut self, images: &ProcessedImageSet) -> TexturaResult<ImagePaints> {
        if let Some(cached) = &self.image_cache
            && cached.original_src.shares_pixels(images.original())
            && cached.subject_src.shares_pixels(images.subject())
        {
            return Ok(cached.clone());
        }
        let paints = ImagePaints {
            original_src: images.original().clone(),
            subject_src: images.subject().clone(),
            original: raster_to_image(images.original())?,
            subject: raster_to_image(images.subject())?,
        };
        self.image_cache = Some(paints.clone());
        Ok(paints)
    }
}

fn physical_size(logical: LogicalSize, density: f32) -> TexturaResult<(u32, u32)> {
    let scale = |v: u32| (f64::from(v) * f64::from(density)).round();
    let w = scale(logical.width);
    let h = scale(logical.height);
    let max = f64::from(u16::MAX);
    if w < 1.0 || h < 1.0 || w > max || h > max {
        return Err(TexturaError::render(format!(
            "frame {}x{} at density {density} exceeds renderer limits",
            logical.width, logical.height
        )));
    }
    Ok((w as u32, h as u32))
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn raster_to_image(raster: &Raster) -> TexturaResult<vello_cpu::Image> {
    let w: u16 = raster
        .width()
        .try_into()
        .map_err(|_| TexturaError::render("raster width exceeds u16"))?;
    let h: u16 = raster
        .height()
        .try_into()
        .map_err(|_| TexturaError::render("raster height exceeds u16"))?;
    let pixels: Vec<vello_cpu::peniko::color::PremulRgba8> = raster
        .premul_bytes()
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect();
    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, !raster.is_opaque());
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;

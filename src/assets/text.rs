use crate::foundation::error::{TexturaError, TexturaResult};

/// Families tried, in order, after the layer's own family.
pub const FALLBACK_FAMILIES: &[&str] = &["Inter", "Helvetica Neue", "Arial"];

/// Generic family closing every font stack.
pub const GENERIC_FAMILY: &str = "sans-serif";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout (straight alpha).
pub(crate) struct TextBrushRgba8 {
    /// Red channel.
    pub(crate) r: u8,
    /// Green channel.
    pub(crate) g: u8,
    /// Blue channel.
    pub(crate) b: u8,
    /// Alpha channel.
    pub(crate) a: u8,
}

/// Resolved text styling for one shaping call.
#[derive(Clone, Debug)]
pub(crate) struct TextRunStyle<'a> {
    pub(crate) family: &'a str,
    pub(crate) weight: u16,
    pub(crate) size_px: f32,
    pub(crate) letter_spacing_px: f32,
    pub(crate) brush: TextBrushRgba8,
}

/// Build the CSS-style family list: the named family, the fixed fallbacks, then the generic.
///
/// Quotes and commas are stripped from the requested name so it cannot break out of its slot.
pub fn font_stack_source(family: &str) -> String {
    let cleaned: String = family
        .chars()
        .filter(|c| *c != '"' && *c != ',')
        .collect();
    let cleaned = cleaned.trim();

    let mut parts = Vec::with_capacity(FALLBACK_FAMILIES.len() + 2);
    if !cleaned.is_empty() {
        parts.push(format!("\"{cleaned}\""));
    }
    for f in FALLBACK_FAMILIES {
        if !f.eq_ignore_ascii_case(cleaned) {
            parts.push(format!("\"{f}\""));
        }
    }
    parts.push(GENERIC_FAMILY.to_string());
    parts.join(", ")
}

/// Stateful helper for shaping text with Parley against system and registered fonts.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    /// Construct a new layout engine with fresh Parley contexts.
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Register font bytes; returns the family names they provide.
    pub(crate) fn register_font(&mut self, font_bytes: &[u8]) -> TexturaResult<Vec<String>> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        if families.is_empty() {
            return Err(TexturaError::validation(
                "no font families registered from font bytes",
            ));
        }

        let mut names = Vec::with_capacity(families.len());
        for (id, _) in families {
            if let Some(name) = self.font_ctx.collection.family_name(id) {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    /// `true` when `family` resolves to an installed or registered font.
    pub(crate) fn has_family(&mut self, family: &str) -> bool {
        self.font_ctx.collection.family_by_name(family).is_some()
    }

    /// `true` when any family in the fallback chain (generic included) can shape text.
    pub(crate) fn has_any_font(&mut self) -> bool {
        let sample = TextRunStyle {
            family: "",
            weight: 400,
            size_px: 16.0,
            letter_spacing_px: 0.0,
            brush: TextBrushRgba8::default(),
        };
        let Ok(layout) = self.layout("X", &sample) else {
            return false;
        };
        for line in layout.lines() {
            for item in line.items() {
                if let parley::layout::PositionedLayoutItem::GlyphRun(run) = item
                    && run.glyphs().next().is_some()
                {
                    return true;
                }
            }
        }
        false
    }

    /// Shape a single line of text.
    pub(crate) fn layout(
        &mut self,
        text: &str,
        style: &TextRunStyle<'_>,
    ) -> TexturaResult<parley::Layout<TextBrushRgba8>> {
        if !style.size_px.is_finite() || style.size_px <= 0.0 {
            return Err(TexturaError::validation(
                "text size_px must be finite and > 0",
            ));
        }
        if !style.letter_spacing_px.is_finite() {
            return Err(TexturaError::validation(
                "letter spacing must be finite",
            ));
        }

        let stack = font_stack_source(style.family);
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(stack)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(style.size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(f32::from(style.weight)),
        ));
        builder.push_default(parley::style::StyleProperty::LetterSpacing(
            style.letter_spacing_px,
        ));
        builder.push_default(parley::style::StyleProperty::Brush(style.brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/text.rs"]
mod tests;

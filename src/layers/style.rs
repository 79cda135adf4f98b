use std::ops::RangeInclusive;

use crate::foundation::core::{LayerId, Rgb8};

/// Valid fill opacity.
pub const OPACITY_RANGE: RangeInclusive<f64> = 0.0..=1.0;
/// Valid anchor position, percent of canvas width/height.
pub const POSITION_RANGE: RangeInclusive<f64> = 0.0..=100.0;
/// Valid font size, percent of the canvas' shorter side.
pub const FONT_SIZE_RANGE: RangeInclusive<f64> = 5.0..=50.0;
/// Valid CSS-style font weight.
pub const FONT_WEIGHT_RANGE: RangeInclusive<u16> = 100..=900;
/// Valid rotation in degrees, clockwise positive.
pub const ROTATION_RANGE: RangeInclusive<f64> = -180.0..=180.0;
/// Valid extra spacing between glyphs, in logical pixels.
pub const LETTER_SPACING_RANGE: RangeInclusive<f64> = -5.0..=20.0;

/// Text of the layer every store starts with.
pub const INITIAL_LAYER_TEXT: &str = "Your Text Here";
/// Text of layers created by `add_layer`.
pub const NEW_LAYER_TEXT: &str = "New Text Layer";
/// Family requested by default; resolves through the fallback chain where not installed.
pub const DEFAULT_FONT_FAMILY: &str = "SF Pro Display";

/// Font choices offered to users: `(label, family)`.
pub const FONT_OPTIONS: &[(&str, &str)] = &[
    ("SF Pro Display", "SF Pro Display"),
    ("Inter", "Inter"),
    ("Helvetica", "Helvetica Neue"),
    ("Arial", "Arial"),
    ("System UI", "system-ui"),
];

/// Weight choices offered to users: `(label, weight)`.
pub const WEIGHT_OPTIONS: &[(&str, u16)] = &[
    ("Thin", 100),
    ("Extra Light", 200),
    ("Light", 300),
    ("Regular", 400),
    ("Medium", 500),
    ("Semi Bold", 600),
    ("Bold", 700),
    ("Extra Bold", 800),
    ("Black", 900),
];

/// Swatches offered to users.
pub const COLOR_PRESETS: &[Rgb8] = &[
    Rgb8::new(0xff, 0xff, 0xff),
    Rgb8::new(0x00, 0x00, 0x00),
    Rgb8::new(0xff, 0x00, 0x00),
    Rgb8::new(0x00, 0xff, 0x00),
    Rgb8::new(0x00, 0x00, 0xff),
    Rgb8::new(0xff, 0xff, 0x00),
    Rgb8::new(0xff, 0x00, 0xff),
    Rgb8::new(0x00, 0xff, 0xff),
    Rgb8::new(0xff, 0xa5, 0x00),
    Rgb8::new(0x80, 0x00, 0x80),
    Rgb8::new(0xff, 0xc0, 0xcb),
    Rgb8::new(0x00, 0xff, 0x80),
];

/// Style record of one text layer.
///
/// Ranges are documented by the `*_RANGE` constants; the store does not clamp, so values are
/// expected to arrive already clamped (see [`crate::StyleControl`]).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayerStyle {
    /// Identifier, stable for the layer's lifetime.
    pub id: LayerId,
    /// Content; empty text renders nothing.
    pub text: String,
    /// Fill color.
    pub color: Rgb8,
    /// Fill opacity in `[0, 1]`.
    pub opacity: f64,
    /// Anchor x, percent of canvas width.
    pub x_position: f64,
    /// Anchor y, percent of canvas height.
    pub y_position: f64,
    /// Percent of `min(width, height)`.
    pub font_size: f64,
    /// Requested family.
    pub font_family: String,
    /// Weight in `{100, 200, ..., 900}`.
    pub font_weight: u16,
    /// Degrees about the anchor, clockwise positive.
    pub rotation: f64,
    /// Extra logical pixels between glyphs.
    pub letter_spacing: f64,
}

impl TextLayerStyle {
    /// Default style with the given id and text.
    pub fn new(id: LayerId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            color: Rgb8::WHITE,
            opacity: 1.0,
            x_position: 50.0,
            y_position: 50.0,
            font_size: 20.0,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_weight: 400,
            rotation: 0.0,
            letter_spacing: 0.0,
        }
    }

    /// Fill alpha as the 8-bit value painted: `round(opacity * 255)`.
    pub fn fill_alpha(&self) -> u8 {
        (self.opacity.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    /// `true` when every numeric field lies in its documented range.
    pub fn is_within_ranges(&self) -> bool {
        OPACITY_RANGE.contains(&self.opacity)
            && POSITION_RANGE.contains(&self.x_position)
            && POSITION_RANGE.contains(&self.y_position)
            && FONT_SIZE_RANGE.contains(&self.font_size)
            && FONT_WEIGHT_RANGE.contains(&self.font_weight)
            && self.font_weight % 100 == 0
            && ROTATION_RANGE.contains(&self.rotation)
            && LETTER_SPACING_RANGE.contains(&self.letter_spacing)
    }
}

/// Partial update merged into a [`TextLayerStyle`]; `None` fields are left unchanged.
///
/// Deserializes from camelCase JSON such as `{"opacity": 0.3, "color": "#ff0000"}`.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct LayerUpdate {
    /// New content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// New fill color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb8>,
    /// New opacity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    /// New anchor x.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_position: Option<f64>,
    /// New anchor y.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_position: Option<f64>,
    /// New font size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    /// New family.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// New weight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<u16>,
    /// New rotation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    /// New letter spacing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f64>,
}

impl LayerUpdate {
    /// Parse a JSON patch.
    pub fn from_json(json: &str) -> crate::TexturaResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| crate::TexturaError::validation(format!("invalid layer update: {e}")))
    }

    /// Set the text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the color.
    pub fn with_color(mut self, color: Rgb8) -> Self {
        self.color = Some(color);
        self
    }

    /// Set the opacity.
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    /// Set both anchor coordinates.
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x_position = Some(x);
        self.y_position = Some(y);
        self
    }

    /// Set the font size.
    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = Some(font_size);
        self
    }

    /// Set the family.
    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }

    /// Set the weight.
    pub fn with_font_weight(mut self, weight: u16) -> Self {
        self.font_weight = Some(weight);
        self
    }

    /// Set the rotation.
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = Some(degrees);
        self
    }

    /// Set the letter spacing.
    pub fn with_letter_spacing(mut self, px: f64) -> Self {
        self.letter_spacing = Some(px);
        self
    }

    /// `true` when no field is supplied.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge supplied fields into `style`. The id is never touched.
    pub fn apply_to(&self, style: &mut TextLayerStyle) {
        if let Some(v) = &self.text {
            style.text.clone_from(v);
        }
        if let Some(v) = self.color {
            style.color = v;
        }
        if let Some(v) = self.opacity {
            style.opacity = v;
        }
        if let Some(v) = self.x_position {
            style.x_position = v;
        }
        if let Some(v) = self.y_position {
            style.y_position = v;
        }
        if let Some(v) = self.font_size {
            style.font_size = v;
        }
        if let Some(v) = &self.font_family {
            style.font_family.clone_from(v);
        }
        if let Some(v) = self.font_weight {
            style.font_weight = v;
        }
        if let Some(v) = self.rotation {
            style.rotation = v;
        }
        if let Some(v) = self.letter_spacing {
            style.letter_spacing = v;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/style.rs"]
mod tests;

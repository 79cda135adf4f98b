//! Mapping from UI inputs to single-field layer updates.
//!
//! Every control clamps (and for weights, snaps) before producing a [`LayerUpdate`], so the
//! store only ever receives in-range values. Free-form patches go through
//! [`LayerUpdate::clamped`] for the same guarantee.

use crate::foundation::core::Rgb8;
use crate::foundation::error::TexturaResult;
use crate::layers::style::{
    FONT_SIZE_RANGE, FONT_WEIGHT_RANGE, LETTER_SPACING_RANGE, LayerUpdate, OPACITY_RANGE,
    POSITION_RANGE, ROTATION_RANGE, TextLayerStyle,
};

/// Numeric style control (slider).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StyleControl {
    /// Fill opacity.
    Opacity,
    /// Horizontal anchor.
    XPosition,
    /// Vertical anchor.
    YPosition,
    /// Font size.
    FontSize,
    /// Font weight.
    FontWeight,
    /// Rotation.
    Rotation,
    /// Letter spacing.
    LetterSpacing,
}

impl StyleControl {
    /// All numeric controls in panel order.
    pub const ALL: [Self; 7] = [
        Self::FontWeight,
        Self::Opacity,
        Self::FontSize,
        Self::XPosition,
        Self::YPosition,
        Self::Rotation,
        Self::LetterSpacing,
    ];

    /// Inclusive `(min, max)` accepted by the control.
    pub fn range(self) -> (f64, f64) {
        let bounds = |r: &std::ops::RangeInclusive<f64>| (*r.start(), *r.end());
        match self {
            Self::Opacity => bounds(&OPACITY_RANGE),
            Self::XPosition | Self::YPosition => bounds(&POSITION_RANGE),
            Self::FontSize => bounds(&FONT_SIZE_RANGE),
            Self::FontWeight => (
                f64::from(*FONT_WEIGHT_RANGE.start()),
                f64::from(*FONT_WEIGHT_RANGE.end()),
            ),
            Self::Rotation => bounds(&ROTATION_RANGE),
            Self::LetterSpacing => bounds(&LETTER_SPACING_RANGE),
        }
    }

    /// Slider increment.
    pub fn step(self) -> f64 {
        match self {
            Self::Opacity => 0.1,
            Self::FontWeight => 100.0,
            _ => 1.0,
        }
    }

    /// Clamp `value` into range. Non-finite input falls back to the range minimum.
    pub fn clamp(self, value: f64) -> f64 {
        let (lo, hi) = self.range();
        if !value.is_finite() {
            return lo;
        }
        let v = value.clamp(lo, hi);
        match self {
            Self::FontWeight => ((v / 100.0).round() * 100.0).clamp(lo, hi),
            // Integer-valued on the source slider.
            Self::LetterSpacing => v.trunc(),
            _ => v,
        }
    }

    /// Update produced by moving this control to `value`.
    pub fn update(self, value: f64) -> LayerUpdate {
        let v = self.clamp(value);
        let u = LayerUpdate::default();
        match self {
            Self::Opacity => u.with_opacity(v),
            Self::XPosition => LayerUpdate {
                x_position: Some(v),
                ..u
            },
            Self::YPosition => LayerUpdate {
                y_position: Some(v),
                ..u
            },
            Self::FontSize => u.with_font_size(v),
            Self::FontWeight => u.with_font_weight(v as u16),
            Self::Rotation => u.with_rotation(v),
            Self::LetterSpacing => u.with_letter_spacing(v),
        }
    }

    /// Current value of this control for `style`.
    pub fn value_of(self, style: &TextLayerStyle) -> f64 {
        match self {
            Self::Opacity => style.opacity,
            Self::XPosition => style.x_position,
            Self::YPosition => style.y_position,
            Self::FontSize => style.font_size,
            Self::FontWeight => f64::from(style.font_weight),
            Self::Rotation => style.rotation,
            Self::LetterSpacing => style.letter_spacing,
        }
    }
}

impl LayerUpdate {
    /// Copy of this update with every numeric field passed through its control's clamp.
    pub fn clamped(&self) -> Self {
        let clamp = |control: StyleControl, v: Option<f64>| v.map(|v| control.clamp(v));
        Self {
            opacity: clamp(StyleControl::Opacity, self.opacity),
            x_position: clamp(StyleControl::XPosition, self.x_position),
            y_position: clamp(StyleControl::YPosition, self.y_position),
            font_size: clamp(StyleControl::FontSize, self.font_size),
            font_weight: self
                .font_weight
                .map(|w| StyleControl::FontWeight.clamp(f64::from(w)) as u16),
            rotation: clamp(StyleControl::Rotation, self.rotation),
            letter_spacing: clamp(StyleControl::LetterSpacing, self.letter_spacing),
            ..self.clone()
        }
    }
}

/// Update from the text input.
pub fn text_update(text: impl Into<String>) -> LayerUpdate {
    LayerUpdate::default().with_text(text)
}

/// Update from the color picker or a swatch (`#rrggbb` / `#rgb`).
pub fn color_update(hex: &str) -> TexturaResult<LayerUpdate> {
    Ok(LayerUpdate::default().with_color(Rgb8::from_hex(hex)?))
}

/// Update from the font family selector.
pub fn font_family_update(family: impl Into<String>) -> LayerUpdate {
    LayerUpdate::default().with_font_family(family)
}

#[cfg(test)]
#[path = "../../tests/unit/layers/controls.rs"]
mod tests;

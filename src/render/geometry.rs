use crate::foundation::core::{Affine, LogicalSize, Point, Vec2};
use crate::layers::style::TextLayerStyle;

/// Where and how large one text layer is drawn, in logical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerGeometry {
    /// Absolute font size: `ceil(min(w, h) * font_size / 100)`.
    pub font_px: f64,
    /// Center of the text box.
    pub anchor: Point,
    /// Clockwise rotation about `anchor`, in radians.
    pub rotation_rad: f64,
}

impl LayerGeometry {
    /// Transform placing a `box_w` x `box_h` text box (origin top-left) centered on the anchor
    /// and rotated about it.
    pub fn text_transform(&self, box_w: f64, box_h: f64) -> Affine {
        Affine::translate(self.anchor.to_vec2())
            * Affine::rotate(self.rotation_rad)
            * Affine::translate(Vec2::new(-box_w / 2.0, -box_h / 2.0))
    }
}

/// Resolve percentage-based style fields against the canvas' logical size.
pub fn layer_geometry(style: &TextLayerStyle, logical: LogicalSize) -> LayerGeometry {
    let w = f64::from(logical.width);
    let h = f64::from(logical.height);
    LayerGeometry {
        font_px: (f64::from(logical.min_side()) * style.font_size / 100.0).ceil(),
        anchor: Point::new(style.x_position / 100.0 * w, style.y_position / 100.0 * h),
        rotation_rad: style.rotation.to_radians(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/geometry.rs"]
mod tests;

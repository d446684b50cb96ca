//! Text object.

use super::{ShapeId, ShapeStyle, ShapeTrait};
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A block of text placed on the surface.
///
/// Glyphs are laid out by whoever rasterizes the surface; the object only
/// carries an approximate extent so bounds stay stable without a font.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Text {
    pub(crate) id: ShapeId,
    /// Position (top-left corner of the text box).
    pub position: Point,
    /// The text content; `\n` separates lines.
    pub content: String,
    /// Font size in content units.
    pub font_size: f64,
    /// Style properties (stroke color is the glyph color).
    pub style: ShapeStyle,
}

impl Text {
    /// Default font size.
    pub const DEFAULT_FONT_SIZE: f64 = 24.0;
    /// Average glyph advance relative to the font size.
    const CHAR_WIDTH_FACTOR: f64 = 0.6;
    /// Line height relative to the font size.
    const LINE_HEIGHT_FACTOR: f64 = 1.2;

    /// Create a new text object.
    pub fn new(position: Point, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            content,
            font_size: Self::DEFAULT_FONT_SIZE,
            style: ShapeStyle::default(),
        }
    }

    /// Set the font size.
    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    /// Approximate width of the widest line.
    pub fn approximate_width(&self) -> f64 {
        let widest = self
            .content
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        widest as f64 * self.font_size * Self::CHAR_WIDTH_FACTOR
    }

    /// Approximate height of all lines.
    pub fn approximate_height(&self) -> f64 {
        let lines = self.content.lines().count().max(1);
        lines as f64 * self.font_size * Self::LINE_HEIGHT_FACTOR
    }

    /// Height of one line.
    pub fn line_height(&self) -> f64 {
        self.font_size * Self::LINE_HEIGHT_FACTOR
    }
}

impl ShapeTrait for Text {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        Rect::from_origin_size(
            self.position,
            (self.approximate_width().max(self.font_size), self.approximate_height()),
        )
    }

    fn to_path(&self) -> BezPath {
        // Text has no outline of its own; the box stands in for it.
        self.bounds().to_path(0.1)
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        let coeffs = affine.as_coeffs();
        self.position = affine * self.position;
        self.font_size *= coeffs[3].abs();
    }
}

//! Drawing objects owned by the drawing surface.

mod ellipse;
mod freehand;
mod line;
mod rectangle;
mod spray;
mod text;
mod triangle;

pub use ellipse::Ellipse;
pub use freehand::Freehand;
pub use line::Line;
pub use rectangle::Rectangle;
pub use spray::{Spray, SprayDot};
pub use text::Text;
pub use triangle::Triangle;

use kurbo::{Affine, BezPath, Rect};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Straight RGBA8 color as stored in scene documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`. Anything else is `None`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().strip_prefix('#')?;
        // Byte slicing below needs single-byte characters.
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => Some(Self::new(
                channel(&hex[0..1])? * 17,
                channel(&hex[1..2])? * 17,
                channel(&hex[2..3])? * 17,
                255,
            )),
            6 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            )),
            8 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            )),
            _ => None,
        }
    }

    /// Return this color with its alpha multiplied by `opacity`.
    pub fn with_opacity(self, opacity: f64) -> Self {
        let alpha = (self.a as f64 * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a: alpha, ..self }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// How an object's pixels combine with what is already drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeMode {
    /// Paint over existing pixels.
    #[default]
    Normal,
    /// Destination-out: clear existing pixels where the object is painted.
    Erase,
}

/// Style properties for drawing objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    /// Stroke color.
    pub stroke_color: SerializableColor,
    /// Stroke width in content units.
    pub stroke_width: f64,
    /// Interior fill; unfilled when `None`.
    #[serde(default)]
    pub fill_color: Option<SerializableColor>,
    /// Multiplies the alpha of both stroke and fill (highlighter effect).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Composite mode.
    #[serde(default)]
    pub composite: CompositeMode,
}

fn default_opacity() -> f64 {
    1.0
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::black(),
            stroke_width: 2.0,
            fill_color: None,
            opacity: 1.0,
            composite: CompositeMode::Normal,
        }
    }
}

impl ShapeStyle {
    /// Stroke paint after opacity.
    pub fn stroke_with_opacity(&self) -> Color {
        self.stroke_color.with_opacity(self.opacity).into()
    }

    /// Fill paint after opacity.
    pub fn fill_with_opacity(&self) -> Option<Color> {
        self.fill_color.map(|c| c.with_opacity(self.opacity).into())
    }

    /// Whether this object erases instead of painting.
    pub fn is_eraser(&self) -> bool {
        self.composite == CompositeMode::Erase
    }
}

/// Unique identifier for drawing objects.
pub type ShapeId = Uuid;

/// Common trait for all drawing objects.
pub trait ShapeTrait {
    /// Stable identifier.
    fn id(&self) -> ShapeId;

    /// Geometric bounding box in content coordinates (stroke width excluded).
    fn bounds(&self) -> Rect;

    /// Outline in content coordinates.
    fn to_path(&self) -> BezPath;

    /// Get the style.
    fn style(&self) -> &ShapeStyle;

    /// Get mutable style.
    fn style_mut(&mut self) -> &mut ShapeStyle;

    /// Apply a transform to this object.
    fn transform(&mut self, affine: Affine);
}

/// Geometric primitive kinds that can be inserted or drawn by drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
    Triangle,
    Line,
    Arrow,
}

/// Enum wrapper for all drawing object types (for serialization).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Freehand(Freehand),
    Spray(Spray),
    Rectangle(Rectangle),
    Ellipse(Ellipse),
    Triangle(Triangle),
    Line(Line),
    Text(Text),
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            Shape::Freehand($s) => $body,
            Shape::Spray($s) => $body,
            Shape::Rectangle($s) => $body,
            Shape::Ellipse($s) => $body,
            Shape::Triangle($s) => $body,
            Shape::Line($s) => $body,
            Shape::Text($s) => $body,
        }
    };
}

impl Shape {
    pub fn id(&self) -> ShapeId {
        dispatch!(self, s => s.id())
    }

    pub fn bounds(&self) -> Rect {
        dispatch!(self, s => s.bounds())
    }

    /// Bounds including half the stroke width on every side, which is the
    /// area the object actually covers when rendered.
    pub fn visual_bounds(&self) -> Rect {
        let bounds = self.bounds();
        match self {
            // Dots and glyphs already carry their own extent.
            Shape::Spray(_) | Shape::Text(_) => bounds,
            _ => {
                let half = self.style().stroke_width / 2.0;
                bounds.inflate(half, half)
            }
        }
    }

    pub fn to_path(&self) -> BezPath {
        dispatch!(self, s => s.to_path())
    }

    pub fn style(&self) -> &ShapeStyle {
        dispatch!(self, s => s.style())
    }

    pub fn style_mut(&mut self) -> &mut ShapeStyle {
        dispatch!(self, s => s.style_mut())
    }

    pub fn transform(&mut self, affine: Affine) {
        dispatch!(self, s => s.transform(affine))
    }

    /// Whether the object paints with the erase composite mode.
    pub fn is_eraser(&self) -> bool {
        self.style().is_eraser()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn test_hex_parsing() {
        assert_eq!(SerializableColor::from_hex("#fff"), Some(SerializableColor::white()));
        assert_eq!(
            SerializableColor::from_hex("#ff000080"),
            Some(SerializableColor::new(255, 0, 0, 128))
        );
        assert_eq!(SerializableColor::from_hex("red"), None);
        assert_eq!(SerializableColor::from_hex("#12"), None);
    }

    #[test]
    fn test_hex_rejects_multibyte_input() {
        // Byte lengths that match a valid form but split a character.
        assert_eq!(SerializableColor::from_hex("#éa"), None);
        assert_eq!(SerializableColor::from_hex("#aéaaa"), None);
        assert_eq!(SerializableColor::from_hex("#ffffffé"), None);
    }

    #[test]
    fn test_opacity_scales_alpha() {
        let color = SerializableColor::black().with_opacity(0.5);
        assert_eq!(color.a, 128);
    }

    #[test]
    fn test_visual_bounds_include_stroke() {
        let mut rect = Rectangle::new(Rect::new(10.0, 10.0, 110.0, 60.0));
        rect.style.stroke_width = 4.0;
        let shape = Shape::Rectangle(rect);
        let visual = shape.visual_bounds();
        assert!((visual.x0 - 8.0).abs() < f64::EPSILON);
        assert!((visual.y1 - 62.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tagged_serialization() {
        let shape = Shape::Line(Line::new(Point::ZERO, Point::new(5.0, 5.0)));
        let json = serde_json::to_string(&shape).unwrap();
        assert!(json.contains("\"type\":\"line\""));
        let back: Shape = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id(), shape.id());
    }
}

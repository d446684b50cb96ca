//! Brush configuration and in-progress stroke building.

use crate::shapes::{
    CompositeMode, Ellipse, Freehand, Line, Rectangle, SerializableColor, Shape, ShapeKind,
    ShapeStyle, Spray, SprayDot, Triangle,
};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Available brushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "brush", content = "shape", rename_all = "snake_case")]
pub enum BrushKind {
    /// Freehand polyline.
    #[default]
    Pencil,
    /// Drag out a geometric primitive.
    Geometric(ShapeKind),
    /// Scatter dots around the pointer.
    Spray,
    /// Freehand stroke that clears pixels (destination-out).
    Eraser,
}

/// Brush settings applied to newly drawn objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushConfig {
    pub kind: BrushKind,
    pub color: SerializableColor,
    pub width: f64,
    pub opacity: f64,
    /// Fill applied to geometric shapes.
    pub fill: Option<SerializableColor>,
    /// Dots emitted per pointer sample for the spray brush.
    pub spray_density: usize,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            kind: BrushKind::Pencil,
            color: SerializableColor::black(),
            width: 3.0,
            opacity: 1.0,
            fill: None,
            spray_density: 20,
        }
    }
}

impl BrushConfig {
    /// An eraser of the given width.
    pub fn eraser(width: f64) -> Self {
        Self {
            kind: BrushKind::Eraser,
            width,
            ..Self::default()
        }
    }

    /// Style for objects produced by this brush.
    ///
    /// The eraser never paints a color: it removes pixels, so whatever is
    /// later placed behind the surface shows through the erased area.
    pub fn style(&self) -> ShapeStyle {
        let composite = match self.kind {
            BrushKind::Eraser => CompositeMode::Erase,
            _ => CompositeMode::Normal,
        };
        ShapeStyle {
            stroke_color: self.color,
            stroke_width: self.width,
            fill_color: match self.kind {
                BrushKind::Geometric(_) => self.fill,
                _ => None,
            },
            opacity: if composite == CompositeMode::Erase { 1.0 } else { self.opacity },
            composite,
        }
    }
}

/// Small deterministic generator for spray dot placement (splitmix32).
#[derive(Debug, Clone)]
struct SprayRng(u32);

impl SprayRng {
    fn next_u32(&mut self) -> u32 {
        self.0 = self.0.wrapping_add(0x9E37_79B9);
        let mut x = self.0;
        x ^= x >> 16;
        x = x.wrapping_mul(0x85EB_CA6B);
        x ^= x >> 13;
        x = x.wrapping_mul(0xC2B2_AE35);
        x ^= x >> 16;
        x
    }

    fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / u32::MAX as f64
    }
}

/// State of a stroke being drawn.
#[derive(Debug, Clone, Default)]
enum StrokeState {
    #[default]
    Idle,
    Active {
        start: Point,
        current: Point,
    },
}

/// Accumulates pointer samples into a drawing object.
#[derive(Debug, Clone, Default)]
pub struct StrokeBuilder {
    state: StrokeState,
    points: Vec<Point>,
    dots: Vec<SprayDot>,
    rng: Option<SprayRng>,
    strokes_started: u32,
}

impl StrokeBuilder {
    /// Create an idle builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a stroke at a content-space point.
    pub fn begin(&mut self, brush: &BrushConfig, point: Point) {
        self.points.clear();
        self.dots.clear();
        self.strokes_started = self.strokes_started.wrapping_add(1);
        self.rng = Some(SprayRng(self.strokes_started.wrapping_mul(0x2545_F491)));
        self.state = StrokeState::Active {
            start: point,
            current: point,
        };
        self.sample(brush, point);
    }

    /// Add a pointer sample.
    pub fn update(&mut self, brush: &BrushConfig, point: Point) {
        if let StrokeState::Active { current, .. } = &mut self.state {
            *current = point;
            self.sample(brush, point);
        }
    }

    fn sample(&mut self, brush: &BrushConfig, point: Point) {
        match brush.kind {
            BrushKind::Pencil | BrushKind::Eraser => self.points.push(point),
            BrushKind::Spray => {
                let Some(rng) = self.rng.as_mut() else { return };
                let radius = brush.width * 2.0;
                for _ in 0..brush.spray_density {
                    let angle = rng.next_f64() * std::f64::consts::TAU;
                    let dist = rng.next_f64().sqrt() * radius;
                    let dot_radius = 0.5 + rng.next_f64() * (brush.width / 4.0).max(0.5);
                    self.dots.push(SprayDot {
                        center: Point::new(point.x + dist * angle.cos(), point.y + dist * angle.sin()),
                        radius: dot_radius,
                    });
                }
            }
            BrushKind::Geometric(_) => {}
        }
    }

    /// Whether a stroke is in progress.
    pub fn is_active(&self) -> bool {
        matches!(self.state, StrokeState::Active { .. })
    }

    /// The object the stroke would produce if it ended now.
    pub fn preview(&self, brush: &BrushConfig) -> Option<Shape> {
        match &self.state {
            StrokeState::Active { start, current } => self.build(brush, *start, *current),
            StrokeState::Idle => None,
        }
    }

    /// Finish the stroke and return the created object, if any.
    pub fn end(&mut self, brush: &BrushConfig, point: Point) -> Option<Shape> {
        self.update(brush, point);
        let shape = match &self.state {
            StrokeState::Active { start, current } => self.build(brush, *start, *current),
            StrokeState::Idle => None,
        };
        self.cancel();
        shape
    }

    /// Abandon the stroke.
    pub fn cancel(&mut self) {
        self.state = StrokeState::Idle;
        self.points.clear();
        self.dots.clear();
    }

    fn build(&self, brush: &BrushConfig, start: Point, end: Point) -> Option<Shape> {
        let mut shape = match brush.kind {
            BrushKind::Pencil | BrushKind::Eraser => {
                if self.points.is_empty() {
                    return None;
                }
                let mut freehand = Freehand::from_points(self.points.clone());
                freehand.simplify(0.5);
                Shape::Freehand(freehand)
            }
            BrushKind::Spray => {
                if self.dots.is_empty() {
                    return None;
                }
                let mut spray = Spray::new();
                spray.dots = self.dots.clone();
                Shape::Spray(spray)
            }
            BrushKind::Geometric(kind) => {
                if (end - start).hypot() < f64::EPSILON {
                    return None;
                }
                geometric_from_drag(kind, start, end)
            }
        };
        *shape.style_mut() = brush.style();
        Some(shape)
    }
}

/// Build a primitive spanning a drag from `start` to `end`.
pub fn geometric_from_drag(kind: ShapeKind, start: Point, end: Point) -> Shape {
    match kind {
        ShapeKind::Rectangle => Shape::Rectangle(Rectangle::from_corners(start, end)),
        ShapeKind::Ellipse => Shape::Ellipse(Ellipse::from_rect(kurbo::Rect::from_points(start, end))),
        ShapeKind::Triangle => Shape::Triangle(Triangle::from_corners(start, end)),
        ShapeKind::Line => Shape::Line(Line::new(start, end)),
        ShapeKind::Arrow => Shape::Line(Line::arrow(start, end)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pencil_stroke() {
        let brush = BrushConfig::default();
        let mut builder = StrokeBuilder::new();
        assert!(!builder.is_active());

        builder.begin(&brush, Point::new(0.0, 0.0));
        builder.update(&brush, Point::new(10.0, 5.0));
        assert!(builder.is_active());
        assert!(builder.preview(&brush).is_some());

        let shape = builder.end(&brush, Point::new(20.0, 20.0)).unwrap();
        assert!(!builder.is_active());
        assert!(matches!(shape, Shape::Freehand(_)));
        assert!(!shape.is_eraser());
    }

    #[test]
    fn test_eraser_uses_erase_mode() {
        let brush = BrushConfig::eraser(20.0);
        let style = brush.style();
        assert_eq!(style.composite, CompositeMode::Erase);
        assert!((style.stroke_width - 20.0).abs() < f64::EPSILON);

        let mut builder = StrokeBuilder::new();
        builder.begin(&brush, Point::ZERO);
        let shape = builder.end(&brush, Point::new(5.0, 0.0)).unwrap();
        assert!(shape.is_eraser());
    }

    #[test]
    fn test_geometric_drag() {
        let brush = BrushConfig {
            kind: BrushKind::Geometric(ShapeKind::Rectangle),
            ..BrushConfig::default()
        };
        let mut builder = StrokeBuilder::new();
        builder.begin(&brush, Point::new(50.0, 50.0));
        let shape = builder.end(&brush, Point::new(10.0, 20.0)).unwrap();
        assert_eq!(shape.bounds(), kurbo::Rect::new(10.0, 20.0, 50.0, 50.0));
    }

    #[test]
    fn test_geometric_click_without_drag_creates_nothing() {
        let brush = BrushConfig {
            kind: BrushKind::Geometric(ShapeKind::Ellipse),
            ..BrushConfig::default()
        };
        let mut builder = StrokeBuilder::new();
        builder.begin(&brush, Point::new(5.0, 5.0));
        assert!(builder.end(&brush, Point::new(5.0, 5.0)).is_none());
    }

    #[test]
    fn test_spray_dots_stay_near_path() {
        let brush = BrushConfig {
            kind: BrushKind::Spray,
            width: 4.0,
            spray_density: 10,
            ..BrushConfig::default()
        };
        let mut builder = StrokeBuilder::new();
        builder.begin(&brush, Point::new(100.0, 100.0));
        let shape = builder.end(&brush, Point::new(100.0, 100.0)).unwrap();
        let Shape::Spray(spray) = shape else { panic!("expected spray") };
        assert_eq!(spray.dots.len(), 20);
        for dot in &spray.dots {
            assert!((dot.center - Point::new(100.0, 100.0)).hypot() <= 8.0 + 1e-9);
        }
    }

    #[test]
    fn test_cancel_discards() {
        let brush = BrushConfig::default();
        let mut builder = StrokeBuilder::new();
        builder.begin(&brush, Point::ZERO);
        builder.cancel();
        assert!(builder.preview(&brush).is_none());
    }
}

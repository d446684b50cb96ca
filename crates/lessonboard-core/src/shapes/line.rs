//! Straight line, optionally with an arrowhead.

use super::{ShapeId, ShapeStyle, ShapeTrait};
use kurbo::{Affine, BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A straight segment between two points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub(crate) id: ShapeId,
    pub start: Point,
    pub end: Point,
    /// Draw an arrowhead at `end`.
    #[serde(default)]
    pub arrow_head: bool,
    /// Style properties.
    pub style: ShapeStyle,
}

impl Line {
    /// Arrowhead length as a multiple of the stroke width.
    const HEAD_LENGTH_FACTOR: f64 = 4.0;
    /// Minimum arrowhead length in content units.
    const HEAD_MIN_LENGTH: f64 = 10.0;

    /// Create a new line.
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            start,
            end,
            arrow_head: false,
            style: ShapeStyle::default(),
        }
    }

    /// Create a line with an arrowhead at `end`.
    pub fn arrow(start: Point, end: Point) -> Self {
        Self {
            arrow_head: true,
            ..Self::new(start, end)
        }
    }

    fn head_length(&self) -> f64 {
        (self.style.stroke_width * Self::HEAD_LENGTH_FACTOR).max(Self::HEAD_MIN_LENGTH)
    }

    /// The two barb endpoints of the arrowhead, if any.
    fn head_points(&self) -> Option<(Point, Point)> {
        if !self.arrow_head {
            return None;
        }
        let dir = self.end - self.start;
        let len = dir.hypot();
        if len < f64::EPSILON {
            return None;
        }
        let back = -dir / len * self.head_length();
        let spread = std::f64::consts::FRAC_PI_6;
        let rotate = |v: Vec2, angle: f64| {
            let (sin, cos) = angle.sin_cos();
            Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
        };
        Some((self.end + rotate(back, spread), self.end + rotate(back, -spread)))
    }
}

impl ShapeTrait for Line {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let rect = Rect::from_points(self.start, self.end);
        match self.head_points() {
            Some((a, b)) => rect.union_pt(a).union_pt(b),
            None => rect,
        }
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.start);
        path.line_to(self.end);
        if let Some((a, b)) = self.head_points() {
            path.move_to(a);
            path.line_to(self.end);
            path.line_to(b);
        }
        path
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        self.start = affine * self.start;
        self.end = affine * self.end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_line_bounds() {
        let line = Line::new(Point::new(10.0, 40.0), Point::new(30.0, 20.0));
        assert_eq!(line.bounds(), Rect::new(10.0, 20.0, 30.0, 40.0));
    }

    #[test]
    fn test_arrow_bounds_include_head() {
        let arrow = Line::arrow(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        let bounds = arrow.bounds();
        assert!(bounds.y0 < 0.0);
        assert!(bounds.y1 > 0.0);
        assert!((bounds.x1 - 100.0).abs() < 1e-9);
    }
}

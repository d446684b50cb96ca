//! Spray-brush strokes: clouds of small dots.

use super::{ShapeId, ShapeStyle, ShapeTrait};
use kurbo::{Affine, BezPath, Circle, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One dot of a spray stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SprayDot {
    pub center: Point,
    pub radius: f64,
}

/// A spray stroke. Dots are generated once while drawing and stored, so a
/// reloaded stroke looks exactly like the one that was drawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spray {
    pub(crate) id: ShapeId,
    pub dots: Vec<SprayDot>,
    /// Style properties (stroke color is the dot color).
    pub style: ShapeStyle,
}

impl Spray {
    /// Create an empty spray stroke.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            dots: Vec::new(),
            style: ShapeStyle::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dots.is_empty()
    }
}

impl Default for Spray {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeTrait for Spray {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        self.dots
            .iter()
            .map(|dot| Circle::new(dot.center, dot.radius).bounding_box())
            .reduce(|acc, r| acc.union(r))
            .unwrap_or(Rect::ZERO)
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        for dot in &self.dots {
            path.extend(Circle::new(dot.center, dot.radius).path_elements(0.1));
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
        let scale = affine.as_coeffs()[0].abs();
        for dot in &mut self.dots {
            dot.center = affine * dot.center;
            dot.radius *= scale;
        }
    }
}

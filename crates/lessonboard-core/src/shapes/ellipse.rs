//! Ellipse shape.

use super::{ShapeId, ShapeStyle, ShapeTrait};
use kurbo::{Affine, BezPath, Ellipse as KurboEllipse, Point, Rect, Shape as _, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An ellipse inscribed in an axis-aligned box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ellipse {
    pub(crate) id: ShapeId,
    /// The box the ellipse touches on all four sides.
    pub rect: Rect,
    pub style: ShapeStyle,
}

impl Ellipse {
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            id: Uuid::new_v4(),
            rect: rect.abs(),
            style: ShapeStyle::default(),
        }
    }

    /// A circle of `radius` around `center`.
    pub fn circle(center: Point, radius: f64) -> Self {
        Self::from_rect(Rect::from_center_size(center, (radius * 2.0, radius * 2.0)))
    }

    pub fn center(&self) -> Point {
        self.rect.center()
    }

    /// Horizontal and vertical radii.
    pub fn radii(&self) -> Vec2 {
        Vec2::new(self.rect.width() / 2.0, self.rect.height() / 2.0)
    }
}

impl ShapeTrait for Ellipse {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        self.rect
    }

    fn to_path(&self) -> BezPath {
        KurboEllipse::from_rect(self.rect).to_path(0.1)
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        self.rect = affine.transform_rect_bbox(self.rect);
    }
}

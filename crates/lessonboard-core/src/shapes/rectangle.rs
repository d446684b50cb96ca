//! Rectangle shape.

use super::{ShapeId, ShapeStyle, ShapeTrait};
use kurbo::{Affine, BezPath, Point, Rect, Shape as _};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An axis-aligned box, optionally with rounded corners.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rectangle {
    pub(crate) id: ShapeId,
    pub rect: Rect,
    #[serde(default)]
    pub corner_radius: f64,
    pub style: ShapeStyle,
}

impl Rectangle {
    pub fn new(rect: Rect) -> Self {
        Self {
            id: Uuid::new_v4(),
            rect: rect.abs(),
            corner_radius: 0.0,
            style: ShapeStyle::default(),
        }
    }

    /// The box spanned by two opposite corners, in either order.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        Self::new(Rect::from_points(p1, p2))
    }
}

impl ShapeTrait for Rectangle {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        self.rect
    }

    fn to_path(&self) -> BezPath {
        let radius = self.corner_radius.min(self.rect.width().min(self.rect.height()) / 2.0);
        if radius > 0.0 {
            self.rect.to_rounded_rect(radius).to_path(0.1)
        } else {
            self.rect.to_path(0.1)
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_normalizes() {
        let rect = Rectangle::from_corners(Point::new(100.0, 80.0), Point::new(20.0, 10.0));
        assert_eq!(rect.bounds(), Rect::new(20.0, 10.0, 100.0, 80.0));
    }

    #[test]
    fn test_transform_scales() {
        let mut rect = Rectangle::new(Rect::new(10.0, 10.0, 30.0, 20.0));
        rect.transform(Affine::scale(2.0));
        assert_eq!(rect.bounds(), Rect::new(20.0, 20.0, 60.0, 40.0));
    }

    #[test]
    fn test_oversized_radius_is_capped() {
        let mut rect = Rectangle::new(Rect::new(0.0, 0.0, 10.0, 4.0));
        rect.corner_radius = 50.0;
        let bbox = rect.to_path().bounding_box();
        assert!((bbox.width() - 10.0).abs() < 1e-6);
        assert!((bbox.height() - 4.0).abs() < 1e-6);
    }
}

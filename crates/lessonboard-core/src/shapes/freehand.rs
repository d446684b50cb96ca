//! Freehand pencil and eraser strokes.

use super::{ShapeId, ShapeStyle, ShapeTrait};
use kurbo::{Affine, BezPath, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A polyline through the sampled pointer positions.
///
/// Eraser strokes are freehand strokes whose style uses the erase
/// composite mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Freehand {
    pub(crate) id: ShapeId,
    pub points: Vec<Point>,
    pub style: ShapeStyle,
}

impl Freehand {
    pub fn from_points(points: Vec<Point>) -> Self {
        Self {
            id: Uuid::new_v4(),
            points,
            style: ShapeStyle::default(),
        }
    }

    /// Drop samples closer than `tolerance` to the chord between the
    /// samples kept around them. Endpoints always survive.
    pub fn simplify(&mut self, tolerance: f64) {
        if self.points.len() > 2 {
            self.points = simplify_polyline(&self.points, tolerance);
        }
    }
}

/// Iterative Douglas-Peucker over index ranges.
fn simplify_polyline(points: &[Point], tolerance: f64) -> Vec<Point> {
    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;

    let mut ranges = vec![(0, last)];
    while let Some((lo, hi)) = ranges.pop() {
        let farthest = (lo + 1..hi)
            .map(|i| (i, chord_distance(points[i], points[lo], points[hi])))
            .max_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((i, distance)) = farthest {
            if distance > tolerance {
                keep[i] = true;
                ranges.push((lo, i));
                ranges.push((i, hi));
            }
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(point, kept)| kept.then_some(*point))
        .collect()
}

fn chord_distance(point: Point, a: Point, b: Point) -> f64 {
    let chord = b - a;
    let length = chord.hypot();
    if length < f64::EPSILON {
        (point - a).hypot()
    } else {
        chord.cross(point - a).abs() / length
    }
}

impl ShapeTrait for Freehand {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let mut points = self.points.iter();
        match points.next() {
            Some(first) => points.fold(Rect::from_points(*first, *first), |acc, p| acc.union_pt(*p)),
            None => Rect::ZERO,
        }
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        if let [first, rest @ ..] = self.points.as_slice() {
            path.move_to(*first);
            if rest.is_empty() {
                // Zero-length segment so a tap still paints a round dot.
                path.line_to(*first);
            }
            for point in rest {
                path.line_to(*point);
            }
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
        self.points.iter_mut().for_each(|p| *p = affine * *p);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stroke_has_no_extent() {
        let freehand = Freehand::from_points(Vec::new());
        assert_eq!(freehand.bounds(), Rect::ZERO);
        assert!(freehand.to_path().elements().is_empty());
    }

    #[test]
    fn test_bounds_cover_all_points() {
        let freehand = Freehand::from_points(vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 50.0),
            Point::new(50.0, 100.0),
        ]);
        assert_eq!(freehand.bounds(), Rect::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn test_simplify_drops_jitter_keeps_corners() {
        let mut jitter = Freehand::from_points(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.1),
            Point::new(2.0, 0.0),
            Point::new(3.0, 0.1),
            Point::new(4.0, 0.0),
        ]);
        jitter.simplify(0.5);
        assert_eq!(jitter.points, vec![Point::new(0.0, 0.0), Point::new(4.0, 0.0)]);

        let mut corner = Freehand::from_points(vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(10.0, 10.0),
        ]);
        corner.simplify(0.5);
        assert_eq!(corner.points.len(), 3);
        assert_eq!(corner.points[1], Point::new(10.0, 0.0));
    }

    #[test]
    fn test_tap_paints_a_dot() {
        let tap = Freehand::from_points(vec![Point::new(3.0, 4.0)]);
        assert_eq!(tap.to_path().elements().len(), 2);
    }

    #[test]
    fn test_transform_moves_points() {
        let mut freehand = Freehand::from_points(vec![Point::new(1.0, 2.0)]);
        freehand.transform(Affine::translate((10.0, 10.0)));
        assert_eq!(freehand.points[0], Point::new(11.0, 12.0));
    }
}

//! Viewport module for pan/zoom transforms.

use crate::config::{MAX_SCALE, MIN_SCALE};
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Viewport holds the view transform between screen and content space.
///
/// Content space is where strokes and overlay cards live. Screen space is
/// the host container's pixel grid. `screen = content * scale + offset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Current translation offset (pan), in screen pixels.
    pub offset: Vec2,
    /// Current scale, always within `[min_scale, max_scale]`.
    scale: f64,
    /// Minimum allowed scale.
    pub min_scale: f64,
    /// Maximum allowed scale.
    pub max_scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
        }
    }
}

/// One frame of a two-finger gesture, in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchFrame {
    /// Midpoint between the two touches.
    pub centroid: Point,
    /// Distance between the two touches.
    pub distance: f64,
}

impl PinchFrame {
    /// Build a frame from two touch points.
    pub fn from_touches(a: Point, b: Point) -> Self {
        Self {
            centroid: a.midpoint(b),
            distance: (b - a).hypot(),
        }
    }
}

impl Viewport {
    /// Create a viewport with the default scale range.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a viewport with a custom scale range.
    pub fn with_range(min_scale: f64, max_scale: f64) -> Self {
        Self {
            min_scale,
            max_scale,
            ..Self::default()
        }
    }

    /// Current scale.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Get the affine transform for rendering (content to screen).
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    /// The `[a, b, c, d, e, f]` coefficients pushed to the drawing surface.
    pub fn coefficients(&self) -> [f64; 6] {
        [self.scale, 0.0, 0.0, self.scale, self.offset.x, self.offset.y]
    }

    /// Convert a screen point to content coordinates.
    pub fn screen_to_content(&self, screen_point: Point) -> Point {
        Point::new(
            (screen_point.x - self.offset.x) / self.scale,
            (screen_point.y - self.offset.y) / self.scale,
        )
    }

    /// Convert a content point to screen coordinates.
    pub fn content_to_screen(&self, content_point: Point) -> Point {
        Point::new(
            content_point.x * self.scale + self.offset.x,
            content_point.y * self.scale + self.offset.y,
        )
    }

    /// The content-space rectangle visible through a viewport of `size`.
    pub fn visible_content_rect(&self, size: Size) -> Rect {
        let p0 = self.screen_to_content(Point::ZERO);
        let p1 = self.screen_to_content(Point::new(size.width, size.height));
        Rect::from_points(p0, p1)
    }

    /// Pan by a delta in screen coordinates. Offset is unbounded.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom by `factor`, keeping `anchor` (screen space) fixed.
    pub fn zoom(&mut self, factor: f64, anchor: Point) {
        let content_point = self.screen_to_content(anchor);
        self.scale = self.clamp_scale(self.scale * factor);
        self.offset = Vec2::new(
            anchor.x - content_point.x * self.scale,
            anchor.y - content_point.y * self.scale,
        );
    }

    /// Apply one pinch frame relative to the previous one.
    ///
    /// The zoom is anchored at the previous centroid, then the centroid's
    /// movement is added as a pan so scaling and dragging happen together.
    pub fn pinch(&mut self, previous: PinchFrame, current: PinchFrame) {
        if previous.distance > f64::EPSILON {
            self.zoom(current.distance / previous.distance, previous.centroid);
        }
        self.pan(current.centroid - previous.centroid);
    }

    /// Reset to scale 1 with no offset.
    pub fn reset_view(&mut self) {
        self.offset = Vec2::ZERO;
        self.scale = 1.0;
    }

    /// Apply a viewport pushed from outside (e.g. a mirrored zoom control).
    pub fn sync(&mut self, scale: f64, offset_x: f64, offset_y: f64) {
        self.scale = self.clamp_scale(scale);
        self.offset = Vec2::new(offset_x, offset_y);
    }

    /// Size of the drawable canvas needed so panning at minimum zoom never
    /// runs out of area.
    pub fn content_canvas_size(&self, viewport: Size, margin: f64) -> Size {
        Size::new(
            (viewport.width / self.min_scale + margin).ceil(),
            (viewport.height / self.min_scale + margin).ceil(),
        )
    }

    /// Fit the view so `bounds` fills the viewport, centred.
    pub fn fit_to_bounds(&mut self, bounds: Rect, viewport: Size, padding: f64) {
        if bounds.is_zero_area() {
            self.reset_view();
            return;
        }

        let available = Size::new(
            (viewport.width - padding * 2.0).max(1.0),
            (viewport.height - padding * 2.0).max(1.0),
        );
        let scale_x = available.width / bounds.width();
        let scale_y = available.height / bounds.height();
        self.scale = self.clamp_scale(scale_x.min(scale_y));

        let bounds_center = bounds.center();
        self.offset = Vec2::new(
            viewport.width / 2.0 - bounds_center.x * self.scale,
            viewport.height / 2.0 - bounds_center.y * self.scale,
        );
    }

    /// Overflow to infinity or underflow to zero lands on the range ends.
    /// Only NaN leaves the scale unchanged.
    fn clamp_scale(&self, scale: f64) -> f64 {
        if scale.is_nan() {
            self.scale
        } else {
            scale.clamp(self.min_scale, self.max_scale)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_default_viewport() {
        let viewport = Viewport::new();
        assert_eq!(viewport.offset, Vec2::ZERO);
        assert!((viewport.scale() - 1.0).abs() < f64::EPSILON);
        assert_eq!(viewport.coefficients(), [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_screen_to_content_with_offset_and_scale() {
        let mut viewport = Viewport::new();
        viewport.sync(2.0, 50.0, 100.0);
        let content = viewport.screen_to_content(Point::new(150.0, 300.0));
        assert!((content.x - 50.0).abs() < EPS);
        assert!((content.y - 100.0).abs() < EPS);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let mut viewport = Viewport::new();
        viewport.sync(1.5, 30.0, -20.0);

        let original = Point::new(123.0, 456.0);
        let back = viewport.content_to_screen(viewport.screen_to_content(original));
        assert!((back.x - original.x).abs() < EPS);
        assert!((back.y - original.y).abs() < EPS);

        let via_affine = viewport.transform() * viewport.screen_to_content(original);
        assert!((via_affine.x - original.x).abs() < EPS);
        assert!((via_affine.y - original.y).abs() < EPS);
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let mut viewport = Viewport::new();
        let anchor = Point::new(100.0, 100.0);
        let before = viewport.screen_to_content(anchor);

        viewport.zoom(2.0, anchor);

        assert!((viewport.scale() - 2.0).abs() < EPS);
        assert!((viewport.offset.x + 100.0).abs() < EPS);
        assert!((viewport.offset.y + 100.0).abs() < EPS);
        let after = viewport.screen_to_content(anchor);
        assert!((after.x - before.x).abs() < EPS);
        assert!((after.y - before.y).abs() < EPS);
    }

    #[test]
    fn test_zoom_anchor_stable_when_clamped() {
        let mut viewport = Viewport::new();
        viewport.sync(3.0, 17.0, -42.0);
        let anchor = Point::new(321.0, 123.0);
        let before = viewport.screen_to_content(anchor);

        viewport.zoom(10.0, anchor);

        assert!((viewport.scale() - MAX_SCALE).abs() < EPS);
        let after = viewport.screen_to_content(anchor);
        assert!((after.x - before.x).abs() < EPS);
        assert!((after.y - before.y).abs() < EPS);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut viewport = Viewport::new();
        viewport.zoom(0.001, Point::ZERO);
        assert!((viewport.scale() - MIN_SCALE).abs() < f64::EPSILON);

        viewport.zoom(1000.0, Point::ZERO);
        assert!((viewport.scale() - MAX_SCALE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_overflowing_zoom_factor_hits_range_ends() {
        let mut viewport = Viewport::new();
        let anchor = Point::new(40.0, 30.0);
        viewport.zoom(f64::INFINITY, anchor);
        assert!((viewport.scale() - MAX_SCALE).abs() < f64::EPSILON);
        assert!(viewport.offset.x.is_finite() && viewport.offset.y.is_finite());

        viewport.zoom(0.0, anchor);
        assert!((viewport.scale() - MIN_SCALE).abs() < f64::EPSILON);

        viewport.zoom(f64::NAN, anchor);
        assert!((viewport.scale() - MIN_SCALE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sync_clamps_scale_but_not_offset() {
        let mut viewport = Viewport::new();
        viewport.sync(100.0, -1.0e6, 2.0e6);
        assert!((viewport.scale() - MAX_SCALE).abs() < f64::EPSILON);
        assert_eq!(viewport.offset, Vec2::new(-1.0e6, 2.0e6));

        viewport.sync(f64::NAN, 0.0, 0.0);
        assert!((viewport.scale() - MAX_SCALE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pan_and_reset() {
        let mut viewport = Viewport::new();
        viewport.pan(Vec2::new(10.0, 20.0));
        viewport.zoom(2.0, Point::new(5.0, 5.0));
        viewport.reset_view();
        assert_eq!(viewport.offset, Vec2::ZERO);
        assert!((viewport.scale() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pinch_combines_zoom_and_pan() {
        let mut viewport = Viewport::new();
        let previous = PinchFrame::from_touches(Point::new(90.0, 100.0), Point::new(110.0, 100.0));
        let current = PinchFrame::from_touches(Point::new(80.0, 130.0), Point::new(120.0, 130.0));

        let content_under_centroid = viewport.screen_to_content(previous.centroid);
        viewport.pinch(previous, current);

        assert!((viewport.scale() - 2.0).abs() < EPS);
        // The content that was under the old centroid now sits under the new one.
        let screen = viewport.content_to_screen(content_under_centroid);
        assert!((screen.x - current.centroid.x).abs() < EPS);
        assert!((screen.y - current.centroid.y).abs() < EPS);
    }

    #[test]
    fn test_content_canvas_size_covers_min_zoom() {
        let viewport = Viewport::new();
        let size = viewport.content_canvas_size(Size::new(1000.0, 600.0), 200.0);
        assert!((size.width - 4200.0).abs() < EPS);
        assert!((size.height - 2600.0).abs() < EPS);
    }

    #[test]
    fn test_fit_to_bounds_centres_content() {
        let mut viewport = Viewport::new();
        viewport.fit_to_bounds(Rect::new(0.0, 0.0, 200.0, 100.0), Size::new(400.0, 400.0), 0.0);
        assert!((viewport.scale() - 2.0).abs() < EPS);
        let centre = viewport.content_to_screen(Point::new(100.0, 50.0));
        assert!((centre.x - 200.0).abs() < EPS);
        assert!((centre.y - 200.0).abs() < EPS);
    }

    #[test]
    fn test_visible_content_rect() {
        let mut viewport = Viewport::new();
        viewport.sync(2.0, -100.0, -50.0);
        let rect = viewport.visible_content_rect(Size::new(400.0, 300.0));
        assert!((rect.x0 - 50.0).abs() < EPS);
        assert!((rect.y0 - 25.0).abs() < EPS);
        assert!((rect.width() - 200.0).abs() < EPS);
        assert!((rect.height() - 150.0).abs() < EPS);
    }
}

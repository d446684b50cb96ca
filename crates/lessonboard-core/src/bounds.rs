//! Combined extent of strokes and overlay cards.

use crate::overlay::OverlayRegistry;
use crate::surface::DrawingSurface;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Bounds query result, in content coordinates.
///
/// Derived on demand and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub has_content: bool,
}

impl ContentBounds {
    pub fn from_rect(rect: Rect, has_content: bool) -> Self {
        Self {
            left: rect.x0,
            top: rect.y0,
            width: rect.width(),
            height: rect.height(),
            has_content,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.origin(), self.size())
    }

    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Unions stroke and overlay bounds into one padded rectangle.
#[derive(Debug, Clone, Copy)]
pub struct ContentBoundsCalculator {
    padding: f64,
}

impl ContentBoundsCalculator {
    pub fn new(padding: f64) -> Self {
        Self { padding }
    }

    /// Padded union of whichever of the two layers has content.
    ///
    /// Padding is applied once, after the union. With nothing on the board
    /// the result is `{0, 0, viewport}` with `has_content = false`.
    pub fn compute(
        &self,
        surface: &DrawingSurface,
        overlays: &OverlayRegistry,
        viewport: Size,
    ) -> ContentBounds {
        let union = match (surface.raw_bounds(), overlays.bounds()) {
            (Some(strokes), Some(cards)) => Some(strokes.union(cards)),
            (strokes, cards) => strokes.or(cards),
        };

        match union {
            Some(rect) => {
                ContentBounds::from_rect(rect.inflate(self.padding, self.padding), true)
            }
            None => ContentBounds::from_rect(Rect::from_origin_size(Point::ZERO, viewport), false),
        }
    }
}

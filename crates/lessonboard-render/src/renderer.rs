//! Rasterization primitives shared by the stroke and overlay layers.

use kurbo::{Affine, BezPath, PathEl, Point, Rect, Size};
use lessonboard_core::overlay::OverlayItem;
use peniko::Color;
use thiserror::Error;
use tiny_skia::{ColorU8, FilterQuality, PathBuilder, Pixmap, PixmapPaint, Transform};

/// Largest bitmap edge, in pixels, a layer may have unless the export
/// request sets its own limit.
pub const DEFAULT_MAX_DIMENSION: u32 = 16_384;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid bitmap size {width}x{height}")]
    InvalidSize { width: f64, height: f64 },
    #[error("Rasterization failed: {0}")]
    Rasterize(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// A content-space rectangle mapped onto a bitmap.
///
/// Both export layers are built from frames with the same origin, size and
/// multiplier, which is what keeps their pixels aligned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerFrame {
    /// Content point that lands on pixel `(0, 0)`.
    pub origin: Point,
    /// Logical size in content units.
    pub size: Size,
    /// Pixels per content unit.
    pub multiplier: f64,
    /// Largest accepted bitmap edge, in pixels.
    pub max_dimension: u32,
}

impl LayerFrame {
    pub fn new(rect: Rect, multiplier: f64) -> Self {
        Self {
            origin: rect.origin(),
            size: rect.size(),
            multiplier,
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }

    pub fn with_max_dimension(self, max_dimension: u32) -> Self {
        Self {
            max_dimension,
            ..self
        }
    }

    /// Bitmap size in whole pixels.
    pub fn pixel_size(&self) -> RenderResult<(u32, u32)> {
        let width = self.size.width * self.multiplier;
        let height = self.size.height * self.multiplier;
        let invalid = || RenderError::InvalidSize { width, height };

        if !(width.is_finite() && height.is_finite()) || self.multiplier <= 0.0 {
            return Err(invalid());
        }
        // Absorb float noise so 440.0000001 stays 440.
        let w = (width - 1e-6).ceil();
        let h = (height - 1e-6).ceil();
        let max = self.max_dimension as f64;
        if w < 1.0 || h < 1.0 || w > max || h > max {
            return Err(invalid());
        }
        Ok((w as u32, h as u32))
    }

    /// Content space to bitmap pixels.
    pub fn transform(&self) -> Affine {
        Affine::scale(self.multiplier) * Affine::translate(-self.origin.to_vec2())
    }

    /// A transparent bitmap of this frame's size.
    pub fn new_pixmap(&self) -> RenderResult<Pixmap> {
        let (width, height) = self.pixel_size()?;
        Pixmap::new(width, height).ok_or(RenderError::InvalidSize {
            width: width as f64,
            height: height as f64,
        })
    }
}

/// Turns overlay cards into a bitmap.
///
/// Hosts that lay cards out themselves (text reflow, rich content) supply
/// their own implementation; [`crate::CardRasterizer`] is the built-in one.
pub trait OverlayRasterizer {
    /// Rasterize `items` (bottom to top) into a transparent bitmap covering
    /// `frame`.
    fn rasterize(&mut self, items: &[OverlayItem], frame: &LayerFrame) -> RenderResult<Pixmap>;
}

pub(crate) fn to_skia_transform(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

pub(crate) fn to_skia_color(color: Color) -> tiny_skia::Color {
    let rgba = color.to_rgba8();
    tiny_skia::Color::from_rgba8(rgba.r, rgba.g, rgba.b, rgba.a)
}

/// Convert a kurbo path. Empty paths yield `None`.
pub(crate) fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => {
                pb.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32)
            }
            PathEl::CurveTo(p1, p2, p3) => pb.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

/// Decode PNG/JPEG bytes into a premultiplied bitmap.
pub(crate) fn decode_pixmap(bytes: &[u8]) -> RenderResult<Pixmap> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| RenderError::Rasterize(format!("image decode: {e}")))?
        .to_rgba8();
    let (width, height) = decoded.dimensions();
    let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::InvalidSize {
        width: width as f64,
        height: height as f64,
    })?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(decoded.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

/// Draw `image` stretched over `dest` (content space) under `view`.
pub(crate) fn draw_image(target: &mut Pixmap, image: &Pixmap, dest: Rect, view: Affine) {
    if dest.is_zero_area() {
        return;
    }
    let placement = view
        * Affine::translate(dest.origin().to_vec2())
        * Affine::scale_non_uniform(
            dest.width() / image.width() as f64,
            dest.height() / image.height() as f64,
        );
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    target.draw_pixmap(0, 0, image.as_ref(), &paint, to_skia_transform(placement), None);
}

/// Draw `top` over `dest` at the same origin (source-over).
pub(crate) fn composite_over(dest: &mut Pixmap, top: &Pixmap) {
    dest.draw_pixmap(0, 0, top.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_pixel_size() {
        let frame = LayerFrame::new(Rect::new(480.0, 480.0, 920.0, 820.0), 1.0);
        assert_eq!(frame.pixel_size().unwrap(), (440, 340));
        let frame = LayerFrame { multiplier: 2.0, ..frame };
        assert_eq!(frame.pixel_size().unwrap(), (880, 680));
    }

    #[test]
    fn test_frame_rejects_bad_sizes() {
        let empty = LayerFrame::new(Rect::new(0.0, 0.0, 0.0, 10.0), 1.0);
        assert!(matches!(empty.pixel_size(), Err(RenderError::InvalidSize { .. })));
        let huge = LayerFrame::new(Rect::new(0.0, 0.0, 10_000.0, 10.0), 4.0);
        assert!(huge.pixel_size().is_err());
        let negative = LayerFrame::new(Rect::new(0.0, 0.0, 10.0, 10.0), -1.0);
        assert!(negative.pixel_size().is_err());
    }

    #[test]
    fn test_frame_limit_is_adjustable() {
        let frame = LayerFrame::new(Rect::new(0.0, 0.0, 300.0, 100.0), 2.0);
        assert_eq!(frame.max_dimension, DEFAULT_MAX_DIMENSION);
        assert!(frame.with_max_dimension(500).pixel_size().is_err());
        assert_eq!(frame.with_max_dimension(600).pixel_size().unwrap(), (600, 200));

        let wide = LayerFrame::new(Rect::new(0.0, 0.0, 10_000.0, 10.0), 2.0);
        assert!(wide.pixel_size().is_err());
        assert_eq!(
            wide.with_max_dimension(20_000).pixel_size().unwrap(),
            (20_000, 20)
        );
    }

    #[test]
    fn test_frame_transform_maps_origin_to_zero() {
        let frame = LayerFrame::new(Rect::new(480.0, 480.0, 920.0, 820.0), 2.0);
        let p = frame.transform() * Point::new(500.0, 500.0);
        assert!((p.x - 40.0).abs() < 1e-9);
        assert!((p.y - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_path_conversion() {
        let mut path = BezPath::new();
        assert!(to_skia_path(&path).is_none());
        path.move_to((0.0, 0.0));
        path.line_to((10.0, 0.0));
        path.quad_to((15.0, 5.0), (10.0, 10.0));
        path.close_path();
        let converted = to_skia_path(&path).unwrap();
        let bounds = converted.bounds();
        assert!(bounds.left().abs() < f32::EPSILON);
        assert!((bounds.bottom() - 10.0).abs() < f32::EPSILON);
    }
}

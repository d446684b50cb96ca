//! CPU rasterization of the drawing surface.
//!
//! Objects are painted into their own transparent layer so erase strokes
//! (destination-out) only ever clear stroke pixels. The background is
//! painted separately, underneath that layer.

use crate::renderer::{
    LayerFrame, RenderResult, composite_over, decode_pixmap, draw_image, to_skia_color,
    to_skia_path, to_skia_transform,
};
use crate::text::FontBook;
use kurbo::{Affine, Point, Rect};
use lessonboard_core::shapes::Shape;
use lessonboard_core::surface::{Background, DrawingSurface};
use tiny_skia::{BlendMode, FillRule, LineCap, LineJoin, Paint, Pixmap, Stroke, Transform};

/// Paint every object, back to front, into `pixmap` under `view`.
pub fn paint_objects(pixmap: &mut Pixmap, surface: &DrawingSurface, view: Affine) {
    let transform = to_skia_transform(view);
    for shape in surface.objects() {
        paint_shape(pixmap, shape, transform);
    }
}

fn paint_shape(pixmap: &mut Pixmap, shape: &Shape, transform: Transform) {
    let style = shape.style();
    let erase = style.is_eraser();
    let paint_for = |color: tiny_skia::Color| {
        let mut paint = Paint::default();
        paint.anti_alias = true;
        if erase {
            paint.set_color_rgba8(0, 0, 0, 255);
            paint.blend_mode = BlendMode::DestinationOut;
        } else {
            paint.set_color(color);
        }
        paint
    };
    let stroke_paint = paint_for(to_skia_color(style.stroke_with_opacity()));

    if let Shape::Text(text) = shape {
        for glyph in FontBook::shared().text_outlines(text) {
            pixmap.fill_path(&glyph, &stroke_paint, FillRule::Winding, transform, None);
        }
        return;
    }
    let Some(path) = to_skia_path(&shape.to_path()) else {
        return;
    };

    if let Shape::Spray(_) = shape {
        pixmap.fill_path(&path, &stroke_paint, FillRule::Winding, transform, None);
        return;
    }

    if let Some(fill) = style.fill_with_opacity() {
        let fill_paint = paint_for(to_skia_color(fill));
        pixmap.fill_path(&path, &fill_paint, FillRule::Winding, transform, None);
    }
    if style.stroke_width > 0.0 {
        let stroke = Stroke {
            width: style.stroke_width as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &stroke_paint, &stroke, transform, None);
    }
}

/// Paint the background color and image into `pixmap`.
///
/// The color covers the whole bitmap; the image is placed in content space
/// under `view`. An undecodable image is skipped with a warning.
pub fn paint_background(pixmap: &mut Pixmap, background: &Background, view: Affine) {
    if let Some(color) = background.color {
        pixmap.fill(tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a));
    }
    if let Some(image) = &background.image {
        let decoded = image
            .data()
            .ok_or_else(|| "invalid base64".to_string())
            .and_then(|bytes| decode_pixmap(&bytes).map_err(|e| e.to_string()));
        match decoded {
            Ok(bitmap) => draw_image(pixmap, &bitmap, image.rect(), view),
            Err(e) => log::warn!("Skipping background image: {}", e),
        }
    }
}

/// Rasterize only the stroke layer for `frame`, on transparency.
pub fn stroke_layer(surface: &DrawingSurface, frame: &LayerFrame, view: Affine) -> RenderResult<Pixmap> {
    let mut layer = frame.new_pixmap()?;
    paint_objects(&mut layer, surface, view);
    Ok(layer)
}

/// Rasterize the surface as it is currently configured: its viewport
/// transform, its dimensions and its background.
///
/// `region` selects a rectangle in surface pixels (the whole surface when
/// `None`); `multiplier` scales the output pixel density.
pub fn export_image(surface: &DrawingSurface, region: Option<Rect>, multiplier: f64) -> RenderResult<Pixmap> {
    let region = region.unwrap_or_else(|| Rect::from_origin_size(Point::ZERO, surface.dimensions()));
    let frame = LayerFrame::new(region, multiplier);
    let view = frame.transform() * surface.viewport_transform();

    let mut pixmap = frame.new_pixmap()?;
    paint_background(&mut pixmap, surface.background(), view);
    let strokes = stroke_layer(surface, &frame, view)?;
    composite_over(&mut pixmap, &strokes);
    Ok(pixmap)
}

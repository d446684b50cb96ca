//! Built-in overlay card rasterizer.

use crate::renderer::{
    LayerFrame, OverlayRasterizer, RenderResult, decode_pixmap, draw_image, to_skia_path,
    to_skia_transform,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use kurbo::{Affine, Rect, Shape as _};
use lessonboard_core::overlay::OverlayItem;
use lessonboard_core::shapes::SerializableColor;
use serde::{Deserialize, Serialize};
use tiny_skia::{FillRule, Paint, Pixmap, Stroke};

/// Card appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardStyle {
    pub fill: SerializableColor,
    pub border: SerializableColor,
    /// Border width in content units at card scale 1.
    pub border_width: f64,
    pub corner_radius: f64,
}

impl Default for CardStyle {
    fn default() -> Self {
        Self {
            fill: SerializableColor::white(),
            border: SerializableColor::new(203, 213, 225, 255),
            border_width: 1.0,
            corner_radius: 6.0,
        }
    }
}

/// Draws each card as a bordered panel with its embedded image, if any.
///
/// Card text is not laid out here; hosts that need it provide their own
/// [`OverlayRasterizer`].
#[derive(Debug, Clone, Default)]
pub struct CardRasterizer {
    style: CardStyle,
}

impl CardRasterizer {
    pub fn new(style: CardStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &CardStyle {
        &self.style
    }

    fn paint_card(&self, pixmap: &mut Pixmap, item: &OverlayItem, view: Affine) {
        let rect = item.bounds();
        if rect.is_zero_area() {
            return;
        }
        let radius = self.style.corner_radius * item.scale;
        let outline = rect.to_rounded_rect(radius).to_path(0.1);
        let Some(path) = to_skia_path(&outline) else {
            return;
        };
        let transform = to_skia_transform(view);

        let mut paint = Paint::default();
        paint.anti_alias = true;
        let fill = self.style.fill;
        paint.set_color_rgba8(fill.r, fill.g, fill.b, fill.a);
        pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);

        if let Some(encoded) = &item.payload.image_base64 {
            self.paint_image(pixmap, encoded, rect, item.scale, view);
        }

        if self.style.border_width > 0.0 {
            let border = self.style.border;
            paint.set_color_rgba8(border.r, border.g, border.b, border.a);
            let stroke = Stroke {
                width: (self.style.border_width * item.scale) as f32,
                ..Stroke::default()
            };
            pixmap.stroke_path(&path, &paint, &stroke, transform, None);
        }
    }

    /// Fit the image inside the card, preserving its aspect ratio.
    fn paint_image(&self, pixmap: &mut Pixmap, encoded: &str, card: Rect, scale: f64, view: Affine) {
        let decoded = STANDARD
            .decode(encoded)
            .map_err(|e| e.to_string())
            .and_then(|bytes| decode_pixmap(&bytes).map_err(|e| e.to_string()));
        let image = match decoded {
            Ok(image) => image,
            Err(e) => {
                log::warn!("Skipping card image: {}", e);
                return;
            }
        };

        let pad = (self.style.border_width + 4.0) * scale;
        let inner = Rect::new(card.x0 + pad, card.y0 + pad, card.x1 - pad, card.y1 - pad);
        if inner.width() <= 0.0 || inner.height() <= 0.0 {
            return;
        }
        let fit = (inner.width() / image.width() as f64).min(inner.height() / image.height() as f64);
        let size = (image.width() as f64 * fit, image.height() as f64 * fit);
        let dest = Rect::from_center_size(inner.center(), size);
        draw_image(pixmap, &image, dest, view);
    }
}

impl OverlayRasterizer for CardRasterizer {
    fn rasterize(&mut self, items: &[OverlayItem], frame: &LayerFrame) -> RenderResult<Pixmap> {
        let mut pixmap = frame.new_pixmap()?;
        let view = frame.transform();
        for item in items {
            self.paint_card(&mut pixmap, item, view);
        }
        Ok(pixmap)
    }
}

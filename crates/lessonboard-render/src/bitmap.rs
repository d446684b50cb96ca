//! Bitmap encoding: PNG, JPEG and their base64 forms.

use crate::renderer::{RenderError, RenderResult, composite_over};
use base64::{Engine, engine::general_purpose::STANDARD};
use lessonboard_core::shapes::SerializableColor;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tiny_skia::Pixmap;

/// Output image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
}

impl ExportFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpeg" | "jpg" => Ok(ExportFormat::Jpeg),
            other => Err(format!("unknown image format '{other}'")),
        }
    }
}

/// An encoded image and its pixel size.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedBitmap {
    pub format: ExportFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl EncodedBitmap {
    /// The image as a plain base64 string.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// The image as a `data:` URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.format.mime_type(), self.to_base64())
    }
}

/// Straight (non-premultiplied) RGBA bytes of a bitmap.
pub fn to_rgba(pixmap: &Pixmap) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(pixmap.pixels().len() * 4);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    rgba
}

/// A copy of `pixmap` composited over a solid color.
pub fn flatten(pixmap: &Pixmap, color: SerializableColor) -> RenderResult<Pixmap> {
    let mut flat = Pixmap::new(pixmap.width(), pixmap.height()).ok_or(RenderError::InvalidSize {
        width: pixmap.width() as f64,
        height: pixmap.height() as f64,
    })?;
    flat.fill(tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a));
    composite_over(&mut flat, pixmap);
    Ok(flat)
}

/// Encode a bitmap. JPEG has no alpha, so it is flattened over white first.
/// `quality` (1-100) only affects JPEG.
pub fn encode(pixmap: &Pixmap, format: ExportFormat, quality: u8) -> RenderResult<EncodedBitmap> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let bytes = match format {
        ExportFormat::Png => encode_png(&to_rgba(pixmap), width, height)?,
        ExportFormat::Jpeg => {
            let flat = flatten(pixmap, SerializableColor::white())?;
            encode_jpeg(&flat, quality)?
        }
    };
    log::debug!("Encoded {}x{} {:?} ({} bytes)", width, height, format, bytes.len());
    Ok(EncodedBitmap {
        format,
        width,
        height,
        bytes,
    })
}

fn encode_png(rgba: &[u8], width: u32, height: u32) -> RenderResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::Encode(format!("PNG header: {e}")))?;
        writer
            .write_image_data(rgba)
            .map_err(|e| RenderError::Encode(format!("PNG data: {e}")))?;
    }
    Ok(png_data)
}

fn encode_jpeg(opaque: &Pixmap, quality: u8) -> RenderResult<Vec<u8>> {
    let mut rgb = Vec::with_capacity(opaque.pixels().len() * 3);
    for pixel in opaque.pixels() {
        rgb.extend_from_slice(&[pixel.red(), pixel.green(), pixel.blue()]);
    }

    let mut jpeg_data = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg_data, quality.clamp(1, 100));
    encoder
        .encode(&rgb, opaque.width(), opaque.height(), image::ExtendedColorType::Rgb8)
        .map_err(|e| RenderError::Encode(format!("JPEG: {e}")))?;
    Ok(jpeg_data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half_transparent() -> Pixmap {
        let mut pixmap = Pixmap::new(4, 2).unwrap();
        let mut paint = tiny_skia::Paint::default();
        paint.set_color_rgba8(255, 0, 0, 255);
        let left = tiny_skia::Rect::from_xywh(0.0, 0.0, 2.0, 2.0).unwrap();
        pixmap.fill_rect(left, &paint, tiny_skia::Transform::identity(), None);
        pixmap
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("PNG".parse::<ExportFormat>(), Ok(ExportFormat::Png));
        assert_eq!("jpg".parse::<ExportFormat>(), Ok(ExportFormat::Jpeg));
        assert!("gif".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_png_keeps_alpha() {
        let encoded = encode(&half_transparent(), ExportFormat::Png, 90).unwrap();
        assert_eq!((encoded.width, encoded.height), (4, 2));
        assert_eq!(&encoded.bytes[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&encoded.bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(decoded.get_pixel(3, 1).0[3], 0);
    }

    #[test]
    fn test_jpeg_flattens_over_white() {
        let encoded = encode(&half_transparent(), ExportFormat::Jpeg, 95).unwrap();
        assert_eq!(&encoded.bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&encoded.bytes).unwrap().to_rgb8();
        let [r, g, b] = decoded.get_pixel(3, 1).0;
        assert!(r > 200 && g > 200 && b > 200);
    }

    #[test]
    fn test_data_url() {
        let bitmap = EncodedBitmap {
            format: ExportFormat::Jpeg,
            width: 1,
            height: 1,
            bytes: vec![1, 2, 3],
        };
        assert_eq!(bitmap.to_base64(), "AQID");
        assert_eq!(bitmap.to_data_url(), "data:image/jpeg;base64,AQID");
    }
}

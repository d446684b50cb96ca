//! Lessonboard Render Library
//!
//! Headless CPU rasterization for Lessonboard: the stroke layer, overlay
//! cards, text glyphs, bitmap encoding and the two-layer export compositor.

pub mod bitmap;
pub mod cards;
pub mod compositor;
pub mod renderer;
pub mod strokes;
pub mod text;

pub use bitmap::{EncodedBitmap, ExportFormat, encode};
pub use cards::{CardRasterizer, CardStyle};
pub use compositor::{
    ExportCompositor, ExportError, ExportOutput, ExportPhase, ExportRequest, ExportScope,
    RenderStateGuard, merge, rasterize_overlay, rasterize_strokes,
};
pub use renderer::{
    DEFAULT_MAX_DIMENSION, LayerFrame, OverlayRasterizer, RenderError, RenderResult,
};
pub use strokes::export_image;
pub use text::FontBook;

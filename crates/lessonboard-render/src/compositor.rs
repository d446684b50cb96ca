//! Bitmap export of a whole board.
//!
//! An export rasterizes two layers over the same frame: the overlay cards
//! (bottom) and the drawing surface's strokes (top). For a full-content
//! export the surface is temporarily re-targeted at the content bounds and
//! restored afterwards, whatever happens in between.

use crate::bitmap::{EncodedBitmap, ExportFormat, encode, flatten};
use crate::cards::CardRasterizer;
use crate::renderer::{
    DEFAULT_MAX_DIMENSION, LayerFrame, OverlayRasterizer, RenderError, RenderResult, composite_over,
};
use crate::strokes::{paint_background, stroke_layer};
use kurbo::{Affine, Point, Rect};
use lessonboard_core::bounds::ContentBounds;
use lessonboard_core::overlay::OverlayItem;
use lessonboard_core::shapes::SerializableColor;
use lessonboard_core::surface::{Background, DrawingSurface, RenderState};
use lessonboard_core::whiteboard::Whiteboard;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tiny_skia::Pixmap;

/// What part of the board to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportScope {
    /// Exactly what the viewport shows.
    #[default]
    VisibleArea,
    /// Every stroke and card, regardless of pan and zoom.
    FullContent,
}

/// Export parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportRequest {
    pub scope: ExportScope,
    pub format: ExportFormat,
    /// JPEG quality, 1-100.
    pub quality: u8,
    /// Output pixels per content unit (per screen pixel for the visible area).
    pub multiplier: f64,
    /// Solid color placed under everything. Transparent when unset (PNG).
    pub background: Option<SerializableColor>,
    /// Largest edge, in pixels, of any layer. Larger exports fail with
    /// [`RenderError::InvalidSize`].
    pub max_dimension: u32,
}

impl Default for ExportRequest {
    fn default() -> Self {
        Self {
            scope: ExportScope::default(),
            format: ExportFormat::default(),
            quality: 92,
            multiplier: 1.0,
            background: None,
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }
}

/// Where an export currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportPhase {
    #[default]
    Idle,
    ComputingBounds,
    RenderingOverlayLayer,
    RenderingStrokeLayer,
    Compositing,
    Done,
    Failed,
}

impl ExportPhase {
    /// True between the start and the end of an export.
    pub fn is_running(self) -> bool {
        !matches!(self, ExportPhase::Idle | ExportPhase::Done | ExportPhase::Failed)
    }
}

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("An export is already in progress")]
    Busy,
}

/// A finished export.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    pub bitmap: EncodedBitmap,
    /// Content-space rectangle the bitmap covers.
    pub bounds: ContentBounds,
    /// Scope actually rendered (an empty board falls back to the visible area).
    pub scope: ExportScope,
}

impl ExportOutput {
    pub fn base64(&self) -> String {
        self.bitmap.to_base64()
    }

    pub fn data_url(&self) -> String {
        self.bitmap.to_data_url()
    }
}

/// Swaps a surface's render state and puts the saved one back on drop.
pub struct RenderStateGuard<'a> {
    surface: &'a mut DrawingSurface,
    saved: Option<RenderState>,
}

impl<'a> RenderStateGuard<'a> {
    pub fn new(surface: &'a mut DrawingSurface, temporary: RenderState) -> Self {
        let saved = surface.render_state();
        surface.restore_render_state(temporary);
        Self {
            surface,
            saved: Some(saved),
        }
    }

    pub fn surface(&self) -> &DrawingSurface {
        self.surface
    }
}

impl Drop for RenderStateGuard<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.surface.restore_render_state(saved);
        }
    }
}

/// Rasterize overlay cards over `frame`.
pub fn rasterize_overlay<R: OverlayRasterizer + ?Sized>(
    rasterizer: &mut R,
    items: &[OverlayItem],
    frame: &LayerFrame,
) -> RenderResult<Pixmap> {
    rasterizer.rasterize(items, frame)
}

/// Rasterize the surface's strokes with its current transform and
/// dimensions, on transparency.
pub fn rasterize_strokes(surface: &DrawingSurface, multiplier: f64) -> RenderResult<Pixmap> {
    rasterize_strokes_within(surface, multiplier, DEFAULT_MAX_DIMENSION)
}

fn rasterize_strokes_within(
    surface: &DrawingSurface,
    multiplier: f64,
    max_dimension: u32,
) -> RenderResult<Pixmap> {
    let frame = LayerFrame::new(
        Rect::from_origin_size(Point::ZERO, surface.dimensions()),
        multiplier,
    )
    .with_max_dimension(max_dimension);
    stroke_layer(surface, &frame, frame.transform() * surface.viewport_transform())
}

/// Draw `top` over `bottom`. Both layers must have the same pixel size.
pub fn merge(mut bottom: Pixmap, top: &Pixmap) -> RenderResult<Pixmap> {
    if (bottom.width(), bottom.height()) != (top.width(), top.height()) {
        return Err(RenderError::Rasterize(format!(
            "layer size mismatch: {}x{} vs {}x{}",
            bottom.width(),
            bottom.height(),
            top.width(),
            top.height()
        )));
    }
    composite_over(&mut bottom, top);
    Ok(bottom)
}

/// Runs exports for a board, one at a time.
#[derive(Debug, Default)]
pub struct ExportCompositor<R: OverlayRasterizer = CardRasterizer> {
    rasterizer: R,
    phase: ExportPhase,
}

impl<R: OverlayRasterizer> ExportCompositor<R> {
    pub fn new(rasterizer: R) -> Self {
        Self {
            rasterizer,
            phase: ExportPhase::Idle,
        }
    }

    pub fn phase(&self) -> ExportPhase {
        self.phase
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    /// Return to `Idle` after an export was abandoned mid-flight (a panic
    /// inside a rasterizer leaves the phase where it stopped).
    pub fn reset(&mut self) {
        self.set_phase(ExportPhase::Idle);
    }

    /// Export `board` as an encoded bitmap.
    ///
    /// On failure the board's render state is already restored and no
    /// partial bitmap is returned.
    pub fn export(
        &mut self,
        board: &mut Whiteboard,
        request: &ExportRequest,
    ) -> Result<ExportOutput, ExportError> {
        if self.phase.is_running() {
            return Err(ExportError::Busy);
        }
        self.set_phase(ExportPhase::ComputingBounds);
        match self.run(board, request) {
            Ok(output) => {
                self.set_phase(ExportPhase::Done);
                Ok(output)
            }
            Err(e) => {
                log::error!("Export failed: {}", e);
                self.set_phase(ExportPhase::Failed);
                Err(e.into())
            }
        }
    }

    fn set_phase(&mut self, phase: ExportPhase) {
        if self.phase != phase {
            log::debug!("Export phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }

    fn run(&mut self, board: &mut Whiteboard, request: &ExportRequest) -> RenderResult<ExportOutput> {
        let content = board.content_bounds();
        let scope = if request.scope == ExportScope::FullContent && !content.has_content {
            log::debug!("Nothing to export, falling back to the visible area");
            ExportScope::VisibleArea
        } else {
            request.scope
        };

        let (pixmap, bounds) = match scope {
            ExportScope::FullContent => (self.full_content(board, content.rect(), request)?, content),
            ExportScope::VisibleArea => {
                let visible = board.viewport().visible_content_rect(board.viewport_size());
                (
                    self.visible_area(board, request)?,
                    ContentBounds::from_rect(visible, content.has_content),
                )
            }
        };

        let pixmap = match request.background {
            Some(color) => flatten(&pixmap, color)?,
            None => pixmap,
        };
        let bitmap = encode(&pixmap, request.format, request.quality)?;
        log::info!(
            "Exported {:?} as {}x{} {:?}",
            scope,
            bitmap.width,
            bitmap.height,
            bitmap.format
        );
        Ok(ExportOutput {
            bitmap,
            bounds,
            scope,
        })
    }

    /// Both layers are framed on `rect` with its top-left at pixel `(0, 0)`.
    fn full_content(
        &mut self,
        board: &mut Whiteboard,
        rect: Rect,
        request: &ExportRequest,
    ) -> RenderResult<Pixmap> {
        let (multiplier, limit) = (request.multiplier, request.max_dimension);
        self.set_phase(ExportPhase::RenderingOverlayLayer);
        let frame = LayerFrame::new(rect, multiplier).with_max_dimension(limit);
        let overlay = rasterize_overlay(&mut self.rasterizer, board.overlays().items(), &frame)?;

        self.set_phase(ExportPhase::RenderingStrokeLayer);
        let strokes = {
            let guard = RenderStateGuard::new(
                board.surface_mut(),
                RenderState {
                    transform: Affine::translate((-rect.x0, -rect.y0)),
                    dimensions: rect.size(),
                    background: Background::transparent(),
                },
            );
            rasterize_strokes_within(guard.surface(), multiplier, limit)?
        };

        self.set_phase(ExportPhase::Compositing);
        merge(overlay, &strokes)
    }

    /// Background, cards and strokes as the viewport shows them.
    fn visible_area(&mut self, board: &mut Whiteboard, request: &ExportRequest) -> RenderResult<Pixmap> {
        let (multiplier, limit) = (request.multiplier, request.max_dimension);
        let viewport_size = board.viewport_size();
        let scale = board.viewport().scale();
        let visible = board.viewport().visible_content_rect(viewport_size);

        self.set_phase(ExportPhase::RenderingOverlayLayer);
        // Content units are `scale` screen pixels wide here.
        let frame = LayerFrame::new(visible, multiplier * scale).with_max_dimension(limit);
        let overlay = rasterize_overlay(&mut self.rasterizer, board.overlays().items(), &frame)?;

        self.set_phase(ExportPhase::RenderingStrokeLayer);
        let saved = board.surface().render_state();
        let strokes = {
            let guard = RenderStateGuard::new(
                board.surface_mut(),
                RenderState {
                    transform: saved.transform,
                    dimensions: viewport_size,
                    background: Background::transparent(),
                },
            );
            rasterize_strokes_within(guard.surface(), multiplier, limit)?
        };

        self.set_phase(ExportPhase::Compositing);
        let screen = LayerFrame::new(Rect::from_origin_size(Point::ZERO, viewport_size), multiplier)
            .with_max_dimension(limit);
        let mut base = screen.new_pixmap()?;
        paint_background(&mut base, &saved.background, screen.transform() * saved.transform);
        merge(merge(base, &overlay)?, &strokes)
    }
}

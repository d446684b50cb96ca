//! The drawing surface: owned drawing objects, brush state and scene
//! (de)serialization.

use crate::bounds::ContentBounds;
use crate::brush::{BrushConfig, StrokeBuilder, geometric_from_drag};
use crate::config::EngineConfig;
use crate::error::{CoreError, CoreResult};
use crate::shapes::{CompositeMode, SerializableColor, Shape, ShapeId, ShapeKind, ShapeStyle, Text};
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Current scene document format version.
pub const SCENE_VERSION: u32 = 1;

/// Where inserted objects land when the caller gives no position.
const DEFAULT_INSERT_POSITION: Point = Point::new(100.0, 100.0);
/// Size of inserted primitives when the caller gives none.
const DEFAULT_INSERT_SIZE: Size = Size::new(100.0, 100.0);

/// A raster image painted behind every stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundImage {
    /// Encoded image bytes (PNG or JPEG), base64.
    pub data_base64: String,
    /// Placement in content coordinates.
    pub position: Point,
    pub width: f64,
    pub height: f64,
}

impl BackgroundImage {
    /// Wrap encoded image bytes placed at `position` with a display size.
    pub fn new(data: &[u8], position: Point, width: f64, height: f64) -> Self {
        use base64::{Engine, engine::general_purpose::STANDARD};

        Self {
            data_base64: STANDARD.encode(data),
            position,
            width,
            height,
        }
    }

    /// Decoded image bytes, or `None` if the stored base64 is invalid.
    pub fn data(&self) -> Option<Vec<u8>> {
        use base64::{Engine, engine::general_purpose::STANDARD};
        STANDARD.decode(&self.data_base64).ok()
    }

    /// Placement rectangle in content coordinates.
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.position, (self.width, self.height))
    }
}

/// What sits behind the strokes. Never affected by erasing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Background {
    /// Fill color (None = transparent).
    #[serde(default)]
    pub color: Option<SerializableColor>,
    #[serde(default)]
    pub image: Option<BackgroundImage>,
}

impl Background {
    /// A fully transparent background.
    pub fn transparent() -> Self {
        Self::default()
    }

    /// A plain color background.
    pub fn solid(color: SerializableColor) -> Self {
        Self {
            color: Some(color),
            image: None,
        }
    }
}

/// Structural change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    ObjectAdded(ShapeId),
    ObjectModified(ShapeId),
    ObjectRemoved(ShapeId),
    Cleared,
    /// The whole scene was replaced by `load_json`.
    Loaded,
}

impl SurfaceEvent {
    /// Whether this event records a user edit worth a history entry.
    pub fn is_edit(&self) -> bool {
        !matches!(self, SurfaceEvent::Loaded)
    }
}

/// Options for [`DrawingSurface::add_shape`].
#[derive(Debug, Clone, Default)]
pub struct ShapeOptions {
    /// Top-left corner (or line start).
    pub position: Option<Point>,
    /// Box size (or line delta).
    pub size: Option<Size>,
    /// Style override; defaults to the current brush's painting style.
    pub style: Option<ShapeStyle>,
}

/// Options for [`DrawingSurface::add_text`].
#[derive(Debug, Clone, Default)]
pub struct TextOptions {
    pub position: Option<Point>,
    pub font_size: Option<f64>,
    pub color: Option<SerializableColor>,
}

/// Transform, size and background used when rasterizing the surface.
///
/// Export code swaps these temporarily and restores them afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub transform: Affine,
    pub dimensions: Size,
    pub background: Background,
}

/// Serialized form of the surface.
#[derive(Debug, Serialize, Deserialize)]
struct SceneDocument {
    version: u32,
    #[serde(default)]
    background: Background,
    objects: Vec<Shape>,
}

/// Vector drawing surface.
///
/// Objects are kept back-to-front. Every add/modify/remove queues a
/// [`SurfaceEvent`] that the owner drains with [`DrawingSurface::drain_events`].
#[derive(Debug, Clone)]
pub struct DrawingSurface {
    objects: Vec<Shape>,
    brush: BrushConfig,
    drawing_mode: bool,
    active: Option<ShapeId>,
    stroke: StrokeBuilder,
    background: Background,
    transform: Affine,
    dimensions: Size,
    padding: f64,
    empty_bounds_size: Size,
    events: Vec<SurfaceEvent>,
}

impl Default for DrawingSurface {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl DrawingSurface {
    /// Create an empty surface.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            objects: Vec::new(),
            brush: BrushConfig::default(),
            drawing_mode: true,
            active: None,
            stroke: StrokeBuilder::new(),
            background: Background::transparent(),
            transform: Affine::IDENTITY,
            dimensions: config.empty_bounds_size,
            padding: config.content_padding,
            empty_bounds_size: config.empty_bounds_size,
            events: Vec::new(),
        }
    }

    // --- brush and mode ---

    /// Select the brush used for subsequent strokes.
    pub fn set_brush(&mut self, brush: BrushConfig) {
        self.stroke.cancel();
        self.brush = brush;
    }

    pub fn brush(&self) -> &BrushConfig {
        &self.brush
    }

    /// Toggle free-draw input. Leaving drawing mode drops the selection.
    pub fn set_drawing_mode(&mut self, enabled: bool) {
        self.drawing_mode = enabled;
        if !enabled {
            self.stroke.cancel();
            self.active = None;
        }
    }

    pub fn is_drawing_mode(&self) -> bool {
        self.drawing_mode
    }

    /// The selected object, if any.
    pub fn active(&self) -> Option<ShapeId> {
        self.active
    }

    // --- object mutation ---

    /// Insert an object on top and make it active.
    pub fn add_object(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id();
        self.objects.push(shape);
        self.active = Some(id);
        self.events.push(SurfaceEvent::ObjectAdded(id));
        id
    }

    /// Insert a styled primitive.
    pub fn add_shape(&mut self, kind: ShapeKind, options: ShapeOptions) -> ShapeId {
        let start = options.position.unwrap_or(DEFAULT_INSERT_POSITION);
        let size = options.size.unwrap_or(DEFAULT_INSERT_SIZE);
        let end = start + Vec2::new(size.width, size.height);
        let mut shape = geometric_from_drag(kind, start, end);
        *shape.style_mut() = options.style.unwrap_or_else(|| self.painting_style());
        self.add_object(shape)
    }

    /// Insert a text object.
    pub fn add_text(&mut self, content: &str, options: TextOptions) -> ShapeId {
        let mut text = Text::new(
            options.position.unwrap_or(DEFAULT_INSERT_POSITION),
            content.to_string(),
        );
        if let Some(size) = options.font_size {
            text.font_size = size;
        }
        text.style = self.painting_style();
        if let Some(color) = options.color {
            text.style.stroke_color = color;
        }
        self.add_object(Shape::Text(text))
    }

    /// Current brush style with erase turned off; inserted objects always paint.
    fn painting_style(&self) -> ShapeStyle {
        ShapeStyle {
            fill_color: self.brush.fill,
            opacity: self.brush.opacity,
            composite: CompositeMode::Normal,
            ..self.brush.style()
        }
    }

    /// Apply a transform to one object (move, scale).
    pub fn modify_object(&mut self, id: ShapeId, affine: Affine) -> CoreResult<()> {
        let index = self
            .index_of(id)
            .ok_or_else(|| CoreError::UnknownObject(id.to_string()))?;
        self.objects[index].transform(affine);
        self.events.push(SurfaceEvent::ObjectModified(id));
        Ok(())
    }

    /// Remove one object.
    pub fn remove_object(&mut self, id: ShapeId) -> CoreResult<Shape> {
        let index = self
            .index_of(id)
            .ok_or_else(|| CoreError::UnknownObject(id.to_string()))?;
        let shape = self.objects.remove(index);
        if self.active == Some(id) {
            self.active = None;
        }
        self.events.push(SurfaceEvent::ObjectRemoved(id));
        Ok(shape)
    }

    /// Remove the active object, if any.
    pub fn remove_active(&mut self) -> Option<Shape> {
        let id = self.active?;
        self.remove_object(id).ok()
    }

    /// Remove every object.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.active = None;
        self.stroke.cancel();
        self.events.push(SurfaceEvent::Cleared);
    }

    // --- freehand input (content coordinates) ---

    /// Start a stroke with the current brush. Ignored outside drawing mode.
    pub fn begin_stroke(&mut self, point: Point) -> bool {
        if !self.drawing_mode {
            return false;
        }
        self.stroke.begin(&self.brush, point);
        true
    }

    pub fn extend_stroke(&mut self, point: Point) {
        self.stroke.update(&self.brush, point);
    }

    /// Finish the stroke; the resulting object is added and returned.
    pub fn end_stroke(&mut self, point: Point) -> Option<ShapeId> {
        let shape = self.stroke.end(&self.brush, point)?;
        let id = self.add_object(shape);
        // Strokes are not left selected.
        self.active = None;
        Some(id)
    }

    pub fn cancel_stroke(&mut self) {
        self.stroke.cancel();
    }

    pub fn is_stroking(&self) -> bool {
        self.stroke.is_active()
    }

    /// Object the in-progress stroke would produce.
    pub fn stroke_preview(&self) -> Option<Shape> {
        self.stroke.preview(&self.brush)
    }

    // --- queries ---

    fn index_of(&self, id: ShapeId) -> Option<usize> {
        self.objects.iter().position(|s| s.id() == id)
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.objects.iter().find(|s| s.id() == id)
    }

    /// Objects back to front.
    pub fn objects(&self) -> impl Iterator<Item = &Shape> {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Union of the painted extent of all objects, unpadded.
    ///
    /// Eraser strokes only remove pixels, so they never extend the bounds.
    pub fn raw_bounds(&self) -> Option<Rect> {
        self.objects
            .iter()
            .filter(|s| !s.is_eraser())
            .map(Shape::visual_bounds)
            .reduce(|acc, r| acc.union(r))
    }

    /// Padded content bounds in content coordinates, independent of the
    /// current viewport transform.
    pub fn content_bounds(&self) -> ContentBounds {
        match self.raw_bounds() {
            Some(rect) => ContentBounds::from_rect(rect.inflate(self.padding, self.padding), true),
            None => ContentBounds::from_rect(
                Rect::from_origin_size(Point::ZERO, self.empty_bounds_size),
                false,
            ),
        }
    }

    // --- serialization ---

    /// Serialize every object and the background.
    pub fn export_json(&self) -> CoreResult<String> {
        let doc = SceneDocument {
            version: SCENE_VERSION,
            background: self.background.clone(),
            objects: self.objects.clone(),
        };
        Ok(serde_json::to_string(&doc)?)
    }

    /// Replace the whole scene with a serialized one.
    ///
    /// On malformed input the current scene is left untouched.
    pub fn load_json(&mut self, json: &str) -> CoreResult<()> {
        let doc: SceneDocument = match serde_json::from_str(json) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("Rejected malformed scene document: {}", e);
                return Err(e.into());
            }
        };
        if doc.version > SCENE_VERSION {
            log::warn!("Rejected scene document version {}", doc.version);
            return Err(CoreError::UnsupportedVersion {
                found: doc.version,
                supported: SCENE_VERSION,
            });
        }

        self.stroke.cancel();
        self.active = None;
        self.objects = doc.objects;
        self.background = doc.background;
        self.events.push(SurfaceEvent::Loaded);
        log::debug!("Loaded scene with {} objects", self.objects.len());
        Ok(())
    }

    // --- render state ---

    /// Linear transform from content space to surface pixels.
    pub fn viewport_transform(&self) -> Affine {
        self.transform
    }

    pub fn set_viewport_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    /// Surface size in pixels.
    pub fn dimensions(&self) -> Size {
        self.dimensions
    }

    pub fn set_dimensions(&mut self, size: Size) {
        self.dimensions = size;
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn set_background(&mut self, background: Background) {
        self.background = background;
    }

    pub fn render_state(&self) -> RenderState {
        RenderState {
            transform: self.transform,
            dimensions: self.dimensions,
            background: self.background.clone(),
        }
    }

    pub fn restore_render_state(&mut self, state: RenderState) {
        self.transform = state.transform;
        self.dimensions = state.dimensions;
        self.background = state.background;
    }

    // --- events ---

    /// Take all queued change notifications.
    pub fn drain_events(&mut self) -> Vec<SurfaceEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }
}

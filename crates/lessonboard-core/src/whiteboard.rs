//! The whiteboard: one drawing surface plus everything layered around it.

use crate::bounds::{ContentBounds, ContentBoundsCalculator};
use crate::brush::BrushConfig;
use crate::config::EngineConfig;
use crate::error::CoreResult;
use crate::history::{CanvasSnapshot, HistoryStack};
use crate::input::{Gesture, MouseButton, PointerEvent, TouchEvent, TouchSet, WheelEvent};
use crate::overlay::{OverlayId, OverlayKind, OverlayPayload, OverlayRegistry};
use crate::shapes::{Shape, ShapeId, ShapeKind};
use crate::surface::{Background, DrawingSurface, ShapeOptions, SurfaceEvent, TextOptions};
use crate::viewport::Viewport;
use kurbo::{Affine, Point, Size, Vec2};

/// Callback invoked with the surface events produced by each user action.
pub type ChangeListener = Box<dyn FnMut(&[SurfaceEvent])>;

/// A whiteboard instance.
///
/// Owns the drawing surface, its history, the viewport and the overlay
/// cards. Every method that mutates the surface records history and notifies
/// the change listener before returning.
pub struct Whiteboard {
    config: EngineConfig,
    surface: DrawingSurface,
    history: HistoryStack,
    viewport: Viewport,
    overlays: OverlayRegistry,
    gesture: Gesture,
    touches: TouchSet,
    viewport_size: Size,
    on_change: Option<ChangeListener>,
}

impl Default for Whiteboard {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for Whiteboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Whiteboard")
            .field("objects", &self.surface.len())
            .field("overlays", &self.overlays.len())
            .field("viewport", &self.viewport)
            .field("gesture", &self.gesture)
            .finish_non_exhaustive()
    }
}

impl Whiteboard {
    /// Create an empty board. The empty surface is the first history entry.
    pub fn new(config: EngineConfig) -> Self {
        let surface = DrawingSurface::new(&config);
        let mut history = HistoryStack::new(config.history_limit);
        match CanvasSnapshot::capture(&surface) {
            Ok(snapshot) => history.reset(snapshot),
            Err(e) => log::warn!("Could not capture baseline snapshot: {}", e),
        }

        let mut board = Self {
            viewport: Viewport::with_range(config.min_scale, config.max_scale),
            overlays: OverlayRegistry::new(&config),
            viewport_size: config.empty_bounds_size,
            surface,
            history,
            gesture: Gesture::Idle,
            touches: TouchSet::new(),
            on_change: None,
            config,
        };
        board.apply_viewport();
        board
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register the host's change listener, replacing any previous one.
    pub fn set_on_change(&mut self, listener: impl FnMut(&[SurfaceEvent]) + 'static) {
        self.on_change = Some(Box::new(listener));
    }

    // --- accessors ---

    pub fn surface(&self) -> &DrawingSurface {
        &self.surface
    }

    /// Mutable surface access for render-state changes.
    ///
    /// Object edits made through this reference are recorded by the next
    /// call to [`Whiteboard::commit`].
    pub fn surface_mut(&mut self) -> &mut DrawingSurface {
        &mut self.surface
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn overlays(&self) -> &OverlayRegistry {
        &self.overlays
    }

    pub fn overlays_mut(&mut self) -> &mut OverlayRegistry {
        &mut self.overlays
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn viewport_size(&self) -> Size {
        self.viewport_size
    }

    /// Host container size in screen pixels.
    pub fn set_viewport_size(&mut self, size: Size) {
        self.viewport_size = size;
        self.apply_viewport();
    }

    // --- change recording ---

    /// Record pending surface events into history and notify the listener.
    pub fn commit(&mut self) {
        match self.history.record(&mut self.surface) {
            Ok(events) => self.notify(&events),
            Err(e) => log::warn!("Failed to record history: {}", e),
        }
    }

    fn notify(&mut self, events: &[SurfaceEvent]) {
        if events.is_empty() {
            return;
        }
        if let Some(listener) = self.on_change.as_mut() {
            listener(events);
        }
    }

    /// Make the current surface the only history entry.
    fn reset_history(&mut self) {
        match CanvasSnapshot::capture(&self.surface) {
            Ok(snapshot) => self.history.reset(snapshot),
            Err(e) => log::warn!("Could not capture history baseline: {}", e),
        }
    }

    // --- surface operations ---

    pub fn set_brush(&mut self, brush: BrushConfig) {
        self.cancel_gesture();
        self.surface.set_brush(brush);
    }

    /// Toggle between drawing and pass-through (pan / drag) input.
    pub fn set_drawing_mode(&mut self, enabled: bool) {
        self.cancel_gesture();
        self.surface.set_drawing_mode(enabled);
    }

    pub fn add_shape(&mut self, kind: ShapeKind, options: ShapeOptions) -> ShapeId {
        let id = self.surface.add_shape(kind, options);
        self.commit();
        id
    }

    pub fn add_text(&mut self, content: &str, options: TextOptions) -> ShapeId {
        let id = self.surface.add_text(content, options);
        self.commit();
        id
    }

    pub fn add_object(&mut self, shape: Shape) -> ShapeId {
        let id = self.surface.add_object(shape);
        self.commit();
        id
    }

    pub fn modify_object(&mut self, id: ShapeId, affine: Affine) -> CoreResult<()> {
        self.surface.modify_object(id, affine)?;
        self.commit();
        Ok(())
    }

    pub fn remove_object(&mut self, id: ShapeId) -> CoreResult<Shape> {
        let shape = self.surface.remove_object(id)?;
        self.commit();
        Ok(shape)
    }

    pub fn remove_active(&mut self) -> Option<Shape> {
        let shape = self.surface.remove_active()?;
        self.commit();
        Some(shape)
    }

    pub fn set_background(&mut self, background: Background) {
        self.surface.set_background(background);
    }

    /// Remove every drawing object. History restarts from the empty board.
    pub fn clear(&mut self) {
        self.cancel_gesture();
        self.surface.clear();
        let events = self.surface.drain_events();
        self.reset_history();
        self.notify(&events);
    }

    pub fn undo(&mut self) -> bool {
        self.cancel_gesture();
        let restored = self.history.undo(&mut self.surface);
        if restored {
            self.notify(&[SurfaceEvent::Loaded]);
        }
        restored
    }

    pub fn redo(&mut self) -> bool {
        self.cancel_gesture();
        let restored = self.history.redo(&mut self.surface);
        if restored {
            self.notify(&[SurfaceEvent::Loaded]);
        }
        restored
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn export_json(&self) -> CoreResult<String> {
        self.surface.export_json()
    }

    /// Replace the scene. On success the loaded scene becomes the only
    /// history entry; on failure nothing changes.
    pub fn load_json(&mut self, json: &str) -> CoreResult<()> {
        self.cancel_gesture();
        self.surface.load_json(json)?;
        let events = self.surface.drain_events();
        self.reset_history();
        self.notify(&events);
        Ok(())
    }

    /// Padded union of strokes and overlay cards.
    pub fn content_bounds(&self) -> ContentBounds {
        ContentBoundsCalculator::new(self.config.content_padding).compute(
            &self.surface,
            &self.overlays,
            self.viewport_size,
        )
    }

    // --- overlays ---

    pub fn insert_overlay(
        &mut self,
        kind: OverlayKind,
        position: Point,
        size: Size,
        payload: OverlayPayload,
    ) -> OverlayId {
        self.overlays.insert(kind, position, size, payload)
    }

    pub fn remove_overlay(&mut self, id: OverlayId) -> bool {
        if matches!(self.gesture, Gesture::DraggingOverlay { id: dragged, .. } if dragged == id) {
            self.gesture = Gesture::Idle;
        }
        self.overlays.remove(id).is_some()
    }

    // --- viewport ---

    /// Push the viewport into the surface: transform coefficients and a
    /// canvas large enough for panning at minimum zoom.
    fn apply_viewport(&mut self) {
        self.surface
            .set_viewport_transform(Affine::new(self.viewport.coefficients()));
        self.surface.set_dimensions(
            self.viewport
                .content_canvas_size(self.viewport_size, self.config.canvas_margin),
        );
    }

    pub fn zoom(&mut self, factor: f64, anchor: Point) {
        self.viewport.zoom(factor, anchor);
        self.apply_viewport();
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.viewport.pan(delta);
        self.apply_viewport();
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset_view();
        self.apply_viewport();
    }

    /// Apply a viewport pushed by the host.
    pub fn sync_viewport(&mut self, scale: f64, offset_x: f64, offset_y: f64) {
        self.viewport.sync(scale, offset_x, offset_y);
        self.apply_viewport();
    }

    /// Frame all content in the viewport.
    pub fn fit_to_content(&mut self) {
        let bounds = self.content_bounds();
        if bounds.has_content {
            self.viewport
                .fit_to_bounds(bounds.rect(), self.viewport_size, 0.0);
        } else {
            self.viewport.reset_view();
        }
        self.apply_viewport();
    }

    // --- input ---

    fn cancel_gesture(&mut self) {
        if self.gesture == Gesture::Drawing {
            self.surface.cancel_stroke();
        }
        self.gesture = Gesture::Idle;
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down { position, button, .. } => self.pointer_down(position, button),
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up { position, .. } => self.pointer_up(position),
            PointerEvent::Cancel => self.cancel_gesture(),
        }
    }

    fn pointer_down(&mut self, position: Point, button: MouseButton) {
        if !self.gesture.is_idle() {
            return;
        }
        let content = self.viewport.screen_to_content(position);
        self.gesture = match button {
            MouseButton::Middle => Gesture::Panning { last: position },
            MouseButton::Left if self.surface.is_drawing_mode() => {
                if self.surface.begin_stroke(content) {
                    Gesture::Drawing
                } else {
                    Gesture::Idle
                }
            }
            MouseButton::Left => match self.overlays.hit_test(content) {
                Some(id) => {
                    self.overlays.bring_to_front(id);
                    Gesture::DraggingOverlay { id, last: content }
                }
                None => Gesture::Panning { last: position },
            },
            MouseButton::Right => Gesture::Idle,
        };
    }

    fn pointer_move(&mut self, position: Point) {
        let content = self.viewport.screen_to_content(position);
        match self.gesture {
            Gesture::Drawing => self.surface.extend_stroke(content),
            Gesture::Panning { last } => {
                self.pan(position - last);
                self.gesture = Gesture::Panning { last: position };
            }
            Gesture::DraggingOverlay { id, last } => {
                if self.overlays.translate(id, content - last).is_ok() {
                    self.gesture = Gesture::DraggingOverlay { id, last: content };
                } else {
                    self.gesture = Gesture::Idle;
                }
            }
            Gesture::Idle | Gesture::Pinching { .. } => {}
        }
    }

    fn pointer_up(&mut self, position: Point) {
        if self.gesture == Gesture::Drawing {
            let content = self.viewport.screen_to_content(position);
            self.surface.end_stroke(content);
            self.commit();
        } else if !matches!(self.gesture, Gesture::Pinching { .. }) {
            self.pointer_move(position);
        }
        if !matches!(self.gesture, Gesture::Pinching { .. }) {
            self.gesture = Gesture::Idle;
        }
    }

    /// Wheel over a card with the scale modifier resizes the card; any other
    /// wheel zooms the board at the cursor.
    pub fn handle_wheel(&mut self, event: WheelEvent) {
        let notches = event.notches();
        if notches == 0.0 {
            return;
        }
        if event.modifiers.scales_overlay() {
            let content = self.viewport.screen_to_content(event.position);
            if let Some(id) = self.overlays.hit_test(content) {
                if let Err(e) = self.overlays.wheel_scale(id, notches) {
                    log::warn!("Overlay scale failed: {}", e);
                }
                return;
            }
        }
        self.zoom(self.config.wheel_zoom_step.powf(notches), event.position);
    }

    /// One finger acts as the primary pointer; a second finger turns the
    /// gesture into a pinch until fewer than two remain.
    pub fn handle_touch(&mut self, event: TouchEvent) {
        match event {
            TouchEvent::Start { id, position } => {
                self.touches.set(id, position);
                match self.touches.len() {
                    1 => self.pointer_down(position, MouseButton::Left),
                    _ => {
                        if let Some(frame) = self.touches.pinch_frame() {
                            if self.gesture == Gesture::Drawing {
                                self.surface.cancel_stroke();
                            }
                            self.gesture = Gesture::Pinching { frame };
                        }
                    }
                }
            }
            TouchEvent::Move { id, position } => {
                self.touches.set(id, position);
                if let Gesture::Pinching { frame } = self.gesture {
                    if let Some(current) = self.touches.pinch_frame() {
                        self.viewport.pinch(frame, current);
                        self.apply_viewport();
                        self.gesture = Gesture::Pinching { frame: current };
                    }
                } else if self.touches.is_primary(id) {
                    self.pointer_move(position);
                }
            }
            TouchEvent::End { id } => {
                let was_primary = self.touches.is_primary(id);
                let last = self.touches.get(id);
                self.touches.remove(id);
                if matches!(self.gesture, Gesture::Pinching { .. }) {
                    if self.touches.len() < 2 {
                        self.gesture = Gesture::Idle;
                    }
                } else if was_primary {
                    if let Some(position) = last {
                        self.pointer_up(position);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;
    use kurbo::Rect;
    use std::cell::RefCell;
    use std::rc::Rc;

    const EPS: f64 = 1e-9;

    fn down(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Down {
            position: Point::new(x, y),
            button: MouseButton::Left,
            modifiers: Modifiers::default(),
        }
    }

    fn mv(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Move { position: Point::new(x, y) }
    }

    fn up(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Up {
            position: Point::new(x, y),
            button: MouseButton::Left,
        }
    }

    fn draw_stroke(board: &mut Whiteboard, from: (f64, f64), to: (f64, f64)) {
        board.handle_pointer(down(from.0, from.1));
        board.handle_pointer(mv((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0));
        board.handle_pointer(up(to.0, to.1));
    }

    #[test]
    fn test_drawing_records_history_and_notifies() {
        let mut board = Whiteboard::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        board.set_on_change(move |events| sink.borrow_mut().extend_from_slice(events));

        draw_stroke(&mut board, (10.0, 10.0), (60.0, 40.0));

        assert_eq!(board.surface().len(), 1);
        assert_eq!(board.history().len(), 2);
        assert!(board.can_undo());
        assert!(matches!(seen.borrow().as_slice(), [SurfaceEvent::ObjectAdded(_)]));
    }

    #[test]
    fn test_undo_redo_through_board() {
        let mut board = Whiteboard::default();
        draw_stroke(&mut board, (0.0, 0.0), (10.0, 10.0));
        board.add_shape(ShapeKind::Rectangle, ShapeOptions::default());
        assert_eq!(board.surface().len(), 2);

        assert!(board.undo());
        assert_eq!(board.surface().len(), 1);
        assert!(board.undo());
        assert!(board.surface().is_empty());
        assert!(!board.undo());

        assert!(board.redo());
        assert!(board.redo());
        assert_eq!(board.surface().len(), 2);
        assert!(!board.redo());
    }

    #[test]
    fn test_undo_keeps_background() {
        let mut board = Whiteboard::default();
        let white = crate::shapes::SerializableColor::white();
        board.add_shape(ShapeKind::Rectangle, ShapeOptions::default());
        board.set_background(Background::solid(white));
        board.add_shape(ShapeKind::Ellipse, ShapeOptions::default());

        assert!(board.undo());
        assert_eq!(board.surface().len(), 1);
        assert_eq!(board.surface().background().color, Some(white));
        assert!(board.redo());
        assert_eq!(board.surface().background().color, Some(white));
    }

    #[test]
    fn test_clear_resets_history() {
        let mut board = Whiteboard::default();
        draw_stroke(&mut board, (0.0, 0.0), (10.0, 10.0));
        board.clear();
        assert!(board.surface().is_empty());
        assert_eq!(board.history().len(), 1);
        assert!(!board.undo());
    }

    #[test]
    fn test_drawing_maps_screen_to_content() {
        let mut board = Whiteboard::default();
        board.sync_viewport(2.0, 100.0, 100.0);
        draw_stroke(&mut board, (100.0, 100.0), (300.0, 300.0));
        let bounds = board.surface().objects().next().unwrap().bounds();
        assert!(bounds.x0.abs() < EPS);
        assert!((bounds.x1 - 100.0).abs() < EPS);
    }

    #[test]
    fn test_viewport_pushed_to_surface() {
        let mut board = Whiteboard::default();
        board.set_viewport_size(Size::new(1000.0, 600.0));
        board.zoom(2.0, Point::new(100.0, 100.0));
        assert_eq!(
            board.surface().viewport_transform(),
            Affine::new([2.0, 0.0, 0.0, 2.0, -100.0, -100.0])
        );
        assert_eq!(board.surface().dimensions(), Size::new(4200.0, 2600.0));
    }

    #[test]
    fn test_pass_through_drag_pans() {
        let mut board = Whiteboard::default();
        board.set_drawing_mode(false);
        board.handle_pointer(down(10.0, 10.0));
        board.handle_pointer(mv(30.0, 50.0));
        assert!(matches!(board.gesture(), Gesture::Panning { .. }));
        board.handle_pointer(up(40.0, 60.0));
        assert_eq!(board.viewport().offset, Vec2::new(30.0, 50.0));
        assert!(board.gesture().is_idle());
        assert!(board.surface().is_empty());
    }

    #[test]
    fn test_pass_through_drag_moves_overlay() {
        let mut board = Whiteboard::default();
        board.set_drawing_mode(false);
        let id = board.insert_overlay(
            OverlayKind::Full,
            Point::new(0.0, 0.0),
            Size::new(100.0, 100.0),
            OverlayPayload::default(),
        );
        board.handle_pointer(down(50.0, 50.0));
        // Leaving the container does not end the drag.
        board.handle_pointer(mv(-500.0, 50.0));
        board.handle_pointer(up(-450.0, 70.0));

        assert_eq!(board.overlays().get(id).unwrap().position, Point::new(-450.0, 20.0));
        assert_eq!(board.viewport().offset, Vec2::ZERO);
    }

    #[test]
    fn test_wheel_zooms_or_scales_overlay() {
        let mut board = Whiteboard::default();
        let id = board.insert_overlay(
            OverlayKind::Option,
            Point::new(0.0, 0.0),
            Size::new(100.0, 100.0),
            OverlayPayload::default(),
        );

        board.handle_wheel(WheelEvent {
            position: Point::new(50.0, 50.0),
            delta: Vec2::new(0.0, -100.0),
            modifiers: Modifiers { ctrl: true, ..Modifiers::default() },
        });
        assert!((board.overlays().get(id).unwrap().scale - 1.1).abs() < EPS);
        assert!((board.viewport().scale() - 1.0).abs() < EPS);

        board.handle_wheel(WheelEvent {
            position: Point::new(50.0, 50.0),
            delta: Vec2::new(0.0, -100.0),
            modifiers: Modifiers::default(),
        });
        assert!((board.viewport().scale() - 1.1).abs() < EPS);
    }

    #[test]
    fn test_fit_to_content_frames_objects() {
        let mut board = Whiteboard::default();
        board.set_viewport_size(Size::new(800.0, 600.0));
        board.add_object(Shape::Rectangle(crate::shapes::Rectangle::new(Rect::new(
            0.0, 0.0, 1600.0, 1200.0,
        ))));

        board.fit_to_content();
        let bounds = board.content_bounds().rect();
        let viewport = board.viewport();
        assert!(viewport.scale() < 1.0);
        let center = viewport.content_to_screen(bounds.center());
        assert!((center.x - 400.0).abs() < 1e-6);
        assert!((center.y - 300.0).abs() < 1e-6);
        let top_left = viewport.content_to_screen(Point::new(bounds.x0, bounds.y0));
        let bottom_right = viewport.content_to_screen(Point::new(bounds.x1, bounds.y1));
        assert!(top_left.x >= -1e-6 && top_left.y >= -1e-6);
        assert!(bottom_right.x <= 800.0 + 1e-6 && bottom_right.y <= 600.0 + 1e-6);
        assert_eq!(
            board.surface().viewport_transform(),
            Affine::new(viewport.coefficients())
        );
    }

    #[test]
    fn test_fit_to_content_resets_empty_board() {
        let mut board = Whiteboard::default();
        board.zoom(2.0, Point::new(100.0, 100.0));
        board.pan(Vec2::new(30.0, -10.0));

        board.fit_to_content();
        assert!((board.viewport().scale() - 1.0).abs() < EPS);
        assert_eq!(board.viewport().offset, Vec2::ZERO);
    }

    #[test]
    fn test_huge_wheel_delta_clamps_zoom() {
        let mut board = Whiteboard::default();
        let max = board.viewport().max_scale;
        let min = board.viewport().min_scale;
        let wheel = |dy: f64| WheelEvent {
            position: Point::new(50.0, 50.0),
            delta: Vec2::new(0.0, dy),
            modifiers: Modifiers::default(),
        };

        board.handle_wheel(wheel(-1.0e7));
        assert!((board.viewport().scale() - max).abs() < EPS);
        board.handle_wheel(wheel(1.0e7));
        assert!((board.viewport().scale() - min).abs() < EPS);
    }

    #[test]
    fn test_two_finger_pinch() {
        let mut board = Whiteboard::default();
        board.handle_touch(TouchEvent::Start { id: 1, position: Point::new(90.0, 100.0) });
        assert_eq!(board.gesture(), Gesture::Drawing);
        board.handle_touch(TouchEvent::Start { id: 2, position: Point::new(110.0, 100.0) });
        assert!(matches!(board.gesture(), Gesture::Pinching { .. }));
        assert!(!board.surface().is_stroking());

        board.handle_touch(TouchEvent::Move { id: 1, position: Point::new(80.0, 100.0) });
        board.handle_touch(TouchEvent::Move { id: 2, position: Point::new(120.0, 100.0) });
        assert!((board.viewport().scale() - 2.0).abs() < 1e-6);

        board.handle_touch(TouchEvent::End { id: 2 });
        assert!(board.gesture().is_idle());
        board.handle_touch(TouchEvent::End { id: 1 });
        assert!(board.surface().is_empty());
    }

    #[test]
    fn test_content_bounds_include_overlays() {
        let mut board = Whiteboard::default();
        board.insert_overlay(
            OverlayKind::Stem,
            Point::new(0.0, 0.0),
            Size::new(400.0, 300.0),
            OverlayPayload::default(),
        );
        draw_stroke(&mut board, (50.0, 50.0), (150.0, 150.0));
        let bounds = board.content_bounds();
        assert!(bounds.has_content);
        assert_eq!(bounds.rect(), Rect::new(-20.0, -20.0, 420.0, 320.0));
    }

    #[test]
    fn test_load_json_resets_history_and_rejects_garbage() {
        let mut source = Whiteboard::default();
        draw_stroke(&mut source, (0.0, 0.0), (10.0, 10.0));
        let json = source.export_json().unwrap();

        let mut board = Whiteboard::default();
        board.add_shape(ShapeKind::Ellipse, ShapeOptions::default());
        board.load_json(&json).unwrap();
        assert_eq!(board.surface().len(), 1);
        assert!(!board.can_undo());

        assert!(board.load_json("nope").is_err());
        assert_eq!(board.export_json().unwrap(), json);
    }
}

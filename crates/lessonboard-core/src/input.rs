//! Pointer, wheel and touch input, and the gesture state they drive.

use crate::overlay::OverlayId;
use crate::viewport::PinchFrame;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Wheel delta (in pixels) that counts as one notch.
pub const WHEEL_NOTCH: f64 = 100.0;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Whether a wheel over an overlay card should scale the card instead of
    /// zooming the board.
    pub fn scales_overlay(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer events in screen coordinates relative to the board container.
///
/// The host forwards moves and releases even after the pointer leaves the
/// container, so a drag started on the board finishes on the board.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Move {
        position: Point,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    /// The host lost the pointer (focus change, capture lost).
    Cancel,
}

/// Wheel event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelEvent {
    pub position: Point,
    pub delta: Vec2,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl WheelEvent {
    /// Notches scrolled; positive means "grow" (wheel up).
    pub fn notches(&self) -> f64 {
        -self.delta.y / WHEEL_NOTCH
    }
}

/// Touch identifier assigned by the host.
pub type TouchId = u64;

/// Touch events in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TouchEvent {
    Start { id: TouchId, position: Point },
    Move { id: TouchId, position: Point },
    End { id: TouchId },
}

/// What the current press/drag is doing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// A stroke is being drawn on the surface.
    Drawing,
    /// The board is being panned; `last` is the previous screen point.
    Panning { last: Point },
    /// An overlay card follows the pointer; `last` is in content space.
    DraggingOverlay { id: OverlayId, last: Point },
    /// Two touches are zooming and panning the board.
    Pinching { frame: PinchFrame },
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }
}

/// Active touch points, in the order they went down.
#[derive(Debug, Clone, Default)]
pub struct TouchSet {
    touches: Vec<(TouchId, Point)>,
}

impl TouchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new touch or update an existing one.
    pub fn set(&mut self, id: TouchId, position: Point) {
        match self.touches.iter_mut().find(|(t, _)| *t == id) {
            Some((_, p)) => *p = position,
            None => self.touches.push((id, position)),
        }
    }

    /// Forget a touch. Returns whether it was tracked.
    pub fn remove(&mut self, id: TouchId) -> bool {
        let before = self.touches.len();
        self.touches.retain(|(t, _)| *t != id);
        self.touches.len() != before
    }

    pub fn get(&self, id: TouchId) -> Option<Point> {
        self.touches.iter().find(|(t, _)| *t == id).map(|(_, p)| *p)
    }

    pub fn len(&self) -> usize {
        self.touches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.touches.is_empty()
    }

    /// Whether `id` is the first touch down.
    pub fn is_primary(&self, id: TouchId) -> bool {
        self.touches.first().is_some_and(|(t, _)| *t == id)
    }

    /// Pinch frame of the first two touches.
    pub fn pinch_frame(&self) -> Option<PinchFrame> {
        match self.touches.as_slice() {
            [(_, a), (_, b), ..] => Some(PinchFrame::from_touches(*a, *b)),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.touches.clear();
    }
}

//! Lessonboard Core Library
//!
//! Platform-agnostic data structures and logic for the Lessonboard
//! whiteboard: the drawing surface, its history, the pan/zoom viewport,
//! overlay cards and content bounds.

pub mod bounds;
pub mod brush;
pub mod config;
pub mod error;
pub mod history;
pub mod input;
pub mod overlay;
pub mod shapes;
pub mod surface;
pub mod viewport;
pub mod whiteboard;

pub use bounds::{ContentBounds, ContentBoundsCalculator};
pub use brush::{BrushConfig, BrushKind, StrokeBuilder};
pub use config::EngineConfig;
pub use error::{CoreError, CoreResult};
pub use history::{CanvasSnapshot, HistoryPhase, HistoryStack};
pub use input::{Gesture, Modifiers, MouseButton, PointerEvent, TouchEvent, WheelEvent};
pub use overlay::{OverlayId, OverlayItem, OverlayKind, OverlayPayload, OverlayRegistry};
pub use shapes::{CompositeMode, SerializableColor, Shape, ShapeId, ShapeKind, ShapeStyle};
pub use surface::{Background, BackgroundImage, DrawingSurface, RenderState, SurfaceEvent};
pub use viewport::{PinchFrame, Viewport};
pub use whiteboard::Whiteboard;

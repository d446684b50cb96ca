//! Question cards layered with the stroke canvas.
//!
//! Overlay items live in content space next to the strokes, but they are not
//! drawing objects: the host renders them (text reflow and all) and the
//! export pipeline rasterizes them as a separate layer.

use crate::config::EngineConfig;
use crate::error::{CoreError, CoreResult};
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for overlay items.
pub type OverlayId = Uuid;

/// Which part of a question a card shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    /// The whole question.
    Full,
    /// The question stem only.
    Stem,
    /// A single answer option.
    Option,
}

/// Host-defined card content. The engine never interprets it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlayPayload {
    /// Reference to the question this card was cut from.
    #[serde(default)]
    pub question_id: Option<String>,
    /// Card label, e.g. "stem #1" or "B".
    #[serde(default)]
    pub label: String,
    /// Card body text.
    #[serde(default)]
    pub body: String,
    /// Embedded image (base64), e.g. a cropped scan.
    #[serde(default)]
    pub image_base64: Option<String>,
}

/// A positioned, independently scaled card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayItem {
    pub id: OverlayId,
    pub kind: OverlayKind,
    /// Top-left corner in content coordinates.
    pub position: Point,
    /// Stored layout size before scaling.
    pub size: Size,
    /// Card scale.
    pub scale: f64,
    #[serde(default)]
    pub payload: OverlayPayload,
}

impl OverlayItem {
    /// Create an unscaled card.
    pub fn new(kind: OverlayKind, position: Point, size: Size, payload: OverlayPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            position,
            size,
            scale: 1.0,
            payload,
        }
    }

    /// `{x, y, x + w*scale, y + h*scale}` in content coordinates.
    ///
    /// Uses the stored size, not a measured one.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.size.width * self.scale,
            self.position.y + self.size.height * self.scale,
        )
    }
}

/// Sole owner of the overlay items, kept bottom to top.
#[derive(Debug, Clone)]
pub struct OverlayRegistry {
    items: Vec<OverlayItem>,
    min_scale: f64,
    max_scale: f64,
    scale_step: f64,
}

impl Default for OverlayRegistry {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl OverlayRegistry {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            items: Vec::new(),
            min_scale: config.overlay_min_scale,
            max_scale: config.overlay_max_scale,
            scale_step: config.overlay_scale_step,
        }
    }

    /// Create and insert a card on top.
    pub fn insert(
        &mut self,
        kind: OverlayKind,
        position: Point,
        size: Size,
        payload: OverlayPayload,
    ) -> OverlayId {
        self.insert_item(OverlayItem::new(kind, position, size, payload))
    }

    /// Insert an existing item on top (scale is clamped to the allowed range).
    /// An item with the same id is replaced.
    pub fn insert_item(&mut self, mut item: OverlayItem) -> OverlayId {
        item.scale = self.clamp_scale(item.scale);
        let id = item.id;
        self.items.retain(|existing| existing.id != id);
        self.items.push(item);
        id
    }

    pub fn remove(&mut self, id: OverlayId) -> Option<OverlayItem> {
        let index = self.index_of(id)?;
        Some(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn get(&self, id: OverlayId) -> Option<&OverlayItem> {
        self.items.iter().find(|item| item.id == id)
    }

    fn get_mut(&mut self, id: OverlayId) -> CoreResult<&mut OverlayItem> {
        self.items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| CoreError::UnknownOverlay(id.to_string()))
    }

    fn index_of(&self, id: OverlayId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Place a card's top-left corner.
    pub fn move_to(&mut self, id: OverlayId, position: Point) -> CoreResult<()> {
        self.get_mut(id)?.position = position;
        Ok(())
    }

    /// Shift a card by a content-space delta.
    pub fn translate(&mut self, id: OverlayId, delta: Vec2) -> CoreResult<()> {
        self.get_mut(id)?.position += delta;
        Ok(())
    }

    /// Set a card's scale, clamped. Returns the applied scale.
    pub fn set_scale(&mut self, id: OverlayId, scale: f64) -> CoreResult<f64> {
        let scale = self.clamp_scale(scale);
        self.get_mut(id)?.scale = scale;
        Ok(scale)
    }

    /// Scale a card by one wheel notch per unit of `steps` (positive grows).
    pub fn wheel_scale(&mut self, id: OverlayId, steps: f64) -> CoreResult<f64> {
        let current = self
            .get(id)
            .ok_or_else(|| CoreError::UnknownOverlay(id.to_string()))?
            .scale;
        self.set_scale(id, current + steps * self.scale_step)
    }

    /// Move a card to the top of the stack.
    pub fn bring_to_front(&mut self, id: OverlayId) -> bool {
        match self.index_of(id) {
            Some(index) => {
                let item = self.items.remove(index);
                self.items.push(item);
                true
            }
            None => false,
        }
    }

    /// Topmost card containing a content-space point.
    pub fn hit_test(&self, point: Point) -> Option<OverlayId> {
        self.items
            .iter()
            .rev()
            .find(|item| item.bounds().contains(point))
            .map(|item| item.id)
    }

    /// Items bottom to top.
    pub fn items(&self) -> &[OverlayItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Union of all card bounds, or `None` without cards.
    pub fn bounds(&self) -> Option<Rect> {
        self.items
            .iter()
            .map(OverlayItem::bounds)
            .reduce(|acc, r| acc.union(r))
    }

    fn clamp_scale(&self, scale: f64) -> f64 {
        if scale.is_finite() {
            scale.clamp(self.min_scale, self.max_scale)
        } else {
            1.0
        }
    }
}

//! Snapshot-based undo/redo over the drawing surface.

use crate::error::CoreResult;
use crate::surface::{DrawingSurface, SurfaceEvent};
use std::collections::VecDeque;
use std::sync::Arc;

/// Serialized state of every drawing object at one instant.
///
/// Immutable once created; cloning shares the underlying string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasSnapshot(Arc<str>);

impl CanvasSnapshot {
    /// Capture the surface as it is now.
    pub fn capture(surface: &DrawingSurface) -> CoreResult<Self> {
        Ok(Self(surface.export_json()?.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CanvasSnapshot {
    fn from(json: String) -> Self {
        Self(json.into())
    }
}

/// Whether mutation events are being recorded or a snapshot is being
/// written back into the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryPhase {
    #[default]
    Recording,
    Restoring,
}

/// Bounded history of surface snapshots with a cursor.
///
/// Invariant: `index < len` whenever `len > 0`.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    snapshots: VecDeque<CanvasSnapshot>,
    index: usize,
    limit: usize,
    phase: HistoryPhase,
}

impl HistoryStack {
    /// Create an empty history keeping at most `limit` snapshots.
    pub fn new(limit: usize) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(limit.max(1)),
            index: 0,
            limit: limit.max(1),
            phase: HistoryPhase::Recording,
        }
    }

    pub fn phase(&self) -> HistoryPhase {
        self.phase
    }

    /// Record a new snapshot after the current one.
    ///
    /// Redo entries past the cursor are dropped. When the limit is exceeded
    /// the oldest entry is evicted and the cursor stays on the newest.
    /// Returns `false` (and records nothing) while restoring.
    pub fn capture(&mut self, snapshot: CanvasSnapshot) -> bool {
        if self.phase == HistoryPhase::Restoring {
            return false;
        }

        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.index + 1);
        }
        self.snapshots.push_back(snapshot);

        if self.snapshots.len() > self.limit {
            self.snapshots.pop_front();
        } else {
            self.index = self.snapshots.len() - 1;
        }
        log::debug!("History captured ({}/{})", self.index + 1, self.snapshots.len());
        true
    }

    /// Drain the surface's pending events and capture one snapshot if any
    /// of them was an edit. The drained events are returned for the host.
    pub fn record(&mut self, surface: &mut DrawingSurface) -> CoreResult<Vec<SurfaceEvent>> {
        let events = surface.drain_events();
        if self.phase == HistoryPhase::Recording && events.iter().any(SurfaceEvent::is_edit) {
            self.capture(CanvasSnapshot::capture(surface)?);
        }
        Ok(events)
    }

    /// Step back one snapshot. Returns `false` at the oldest entry.
    pub fn undo(&mut self, surface: &mut DrawingSurface) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.restore(surface, self.index - 1)
    }

    /// Step forward one snapshot. Returns `false` at the newest entry.
    pub fn redo(&mut self, surface: &mut DrawingSurface) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.restore(surface, self.index + 1)
    }

    fn restore(&mut self, surface: &mut DrawingSurface, target: usize) -> bool {
        let Some(snapshot) = self.snapshots.get(target).cloned() else {
            return false;
        };

        // Snapshots track objects only; the background is not an undoable edit.
        let background = surface.background().clone();
        self.phase = HistoryPhase::Restoring;
        let result = surface.load_json(snapshot.as_str());
        surface.set_background(background);
        // The reload's own notifications are not edits.
        surface.drain_events();
        self.phase = HistoryPhase::Recording;

        match result {
            Ok(()) => {
                self.index = target;
                log::debug!("History restored entry {}/{}", target + 1, self.snapshots.len());
                true
            }
            Err(e) => {
                log::warn!("History entry {} could not be restored: {}", target, e);
                false
            }
        }
    }

    /// Replace the history with a single baseline entry.
    pub fn reset(&mut self, initial: CanvasSnapshot) {
        self.snapshots.clear();
        self.snapshots.push_back(initial);
        self.index = 0;
        self.phase = HistoryPhase::Recording;
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.snapshots.is_empty() && self.index < self.snapshots.len() - 1
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Snapshot under the cursor.
    pub fn current(&self) -> Option<&CanvasSnapshot> {
        self.snapshots.get(self.index)
    }
}

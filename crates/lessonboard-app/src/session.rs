//! Saved board sessions.
//!
//! A session file is what a host persists for one board: the serialized
//! scene, the overlay cards, and the view the user last had.

use anyhow::{Context, Result};
use kurbo::Size;
use lessonboard_core::config::EngineConfig;
use lessonboard_core::overlay::OverlayItem;
use lessonboard_core::whiteboard::Whiteboard;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pan/zoom as the host reports it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportState {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

/// One board as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardSession {
    /// Scene document produced by `Whiteboard::export_json`.
    pub scene: Option<String>,
    /// Overlay cards, bottom to top.
    pub overlays: Vec<OverlayItem>,
    pub viewport: ViewportState,
    /// Host container size. Falls back to the configured size when absent.
    pub viewport_size: Option<Size>,
}

impl BoardSession {
    /// Snapshot a live board.
    pub fn capture(board: &Whiteboard) -> Result<Self> {
        let scene = board.export_json().context("serialize scene")?;
        let viewport = board.viewport();
        Ok(Self {
            scene: Some(scene),
            overlays: board.overlays().items().to_vec(),
            viewport: ViewportState {
                scale: viewport.scale(),
                offset_x: viewport.offset.x,
                offset_y: viewport.offset.y,
            },
            viewport_size: Some(board.viewport_size()),
        })
    }

    /// Rebuild a board from this session.
    ///
    /// A malformed scene is an error here: exporting an empty board in its
    /// place would silently produce the wrong image.
    pub fn into_board(self, config: EngineConfig, default_size: Size) -> Result<Whiteboard> {
        let mut board = Whiteboard::new(config);
        board.set_viewport_size(self.viewport_size.unwrap_or(default_size));
        if let Some(scene) = &self.scene {
            board.load_json(scene).context("load scene")?;
        }
        for item in self.overlays {
            board.overlays_mut().insert_item(item);
        }
        board.sync_viewport(self.viewport.scale, self.viewport.offset_x, self.viewport.offset_y);
        log::debug!(
            "Restored board: {} objects, {} overlays",
            board.surface().len(),
            board.overlays().len()
        );
        Ok(board)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read session {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("parse session {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serialize session")?;
        std::fs::write(path, json).with_context(|| format!("write session {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use lessonboard_core::overlay::{OverlayKind, OverlayPayload};
    use lessonboard_core::shapes::ShapeKind;
    use lessonboard_core::surface::ShapeOptions;

    fn sample_board() -> Whiteboard {
        let mut board = Whiteboard::default();
        board.set_viewport_size(Size::new(640.0, 480.0));
        board.add_shape(ShapeKind::Rectangle, ShapeOptions::default());
        board.insert_overlay(
            OverlayKind::Stem,
            Point::new(500.0, 500.0),
            Size::new(400.0, 300.0),
            OverlayPayload {
                label: "Q1".into(),
                ..OverlayPayload::default()
            },
        );
        board.sync_viewport(1.5, -30.0, 12.0);
        board
    }

    #[test]
    fn test_session_file_round_trip() {
        let board = sample_board();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");

        BoardSession::capture(&board).unwrap().save(&path).unwrap();
        let restored = BoardSession::load(&path)
            .unwrap()
            .into_board(EngineConfig::default(), Size::new(100.0, 100.0))
            .unwrap();

        assert_eq!(restored.surface().len(), 1);
        assert_eq!(restored.overlays().items(), board.overlays().items());
        assert_eq!(restored.viewport_size(), Size::new(640.0, 480.0));
        assert!((restored.viewport().scale() - 1.5).abs() < f64::EPSILON);
        assert_eq!(restored.content_bounds(), board.content_bounds());
    }

    #[test]
    fn test_minimal_session_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, "{}").unwrap();

        let board = BoardSession::load(&path)
            .unwrap()
            .into_board(EngineConfig::default(), Size::new(320.0, 200.0))
            .unwrap();
        assert!(board.surface().is_empty());
        assert_eq!(board.viewport_size(), Size::new(320.0, 200.0));
        assert!(!board.content_bounds().has_content);
    }

    #[test]
    fn test_malformed_scene_is_an_error() {
        let session = BoardSession {
            scene: Some("{ not json".into()),
            ..BoardSession::default()
        };
        let err = session
            .into_board(EngineConfig::default(), Size::new(100.0, 100.0))
            .unwrap_err();
        assert!(format!("{err:#}").contains("load scene"));
    }

    #[test]
    fn test_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let err = BoardSession::load(&path).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }
}

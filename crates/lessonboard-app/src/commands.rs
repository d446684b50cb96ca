//! The work behind each subcommand, kept apart from argument parsing.

use crate::config::AppConfig;
use crate::session::BoardSession;
use anyhow::{Context, Result};
use lessonboard_core::bounds::ContentBounds;
use lessonboard_core::shapes::SerializableColor;
use lessonboard_render::{
    CardRasterizer, ExportCompositor, ExportFormat, ExportOutput, ExportRequest, ExportScope,
};
use std::path::{Path, PathBuf};

/// Per-invocation changes to the configured export request.
#[derive(Debug, Clone, Default)]
pub struct ExportOverrides {
    pub scope: Option<ExportScope>,
    pub format: Option<ExportFormat>,
    pub quality: Option<u8>,
    pub multiplier: Option<f64>,
    pub background: Option<SerializableColor>,
    pub max_dimension: Option<u32>,
}

impl ExportOverrides {
    pub fn apply(&self, base: &ExportRequest) -> ExportRequest {
        ExportRequest {
            scope: self.scope.unwrap_or(base.scope),
            format: self.format.unwrap_or(base.format),
            quality: self.quality.unwrap_or(base.quality),
            multiplier: self.multiplier.unwrap_or(base.multiplier),
            background: self.background.or(base.background),
            max_dimension: self.max_dimension.unwrap_or(base.max_dimension),
        }
    }
}

/// Restore `session` and export it.
pub fn export_session(
    config: &AppConfig,
    session: BoardSession,
    request: &ExportRequest,
) -> Result<ExportOutput> {
    let mut board = session.into_board(config.engine.clone(), config.viewport_size)?;
    let mut compositor = ExportCompositor::new(CardRasterizer::new(config.card_style.clone()));
    compositor
        .export(&mut board, request)
        .context("export board")
}

/// Where to write an image: `path` as given, or with the format's extension
/// when it has none.
pub fn output_path(path: &Path, format: ExportFormat) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(format.extension())
    }
}

/// Restore `session` and measure its content.
pub fn session_bounds(config: &AppConfig, session: BoardSession) -> Result<ContentBounds> {
    let board = session.into_board(config.engine.clone(), config.viewport_size)?;
    Ok(board.content_bounds())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Point, Size};
    use lessonboard_core::overlay::{OverlayItem, OverlayKind, OverlayPayload};

    fn session_with_card() -> BoardSession {
        BoardSession {
            overlays: vec![OverlayItem::new(
                OverlayKind::Full,
                Point::new(500.0, 500.0),
                Size::new(400.0, 300.0),
                OverlayPayload::default(),
            )],
            ..BoardSession::default()
        }
    }

    #[test]
    fn test_output_path_gains_format_extension() {
        assert_eq!(
            output_path(Path::new("out/board"), ExportFormat::Jpeg),
            PathBuf::from("out/board.jpg")
        );
        assert_eq!(
            output_path(Path::new("board"), ExportFormat::Png),
            PathBuf::from("board.png")
        );
        assert_eq!(
            output_path(Path::new("board.image"), ExportFormat::Png),
            PathBuf::from("board.image")
        );
    }

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let base = ExportRequest {
            quality: 70,
            ..ExportRequest::default()
        };
        let overrides = ExportOverrides {
            scope: Some(ExportScope::FullContent),
            multiplier: Some(2.0),
            ..ExportOverrides::default()
        };
        let request = overrides.apply(&base);
        assert_eq!(request.scope, ExportScope::FullContent);
        assert_eq!(request.quality, 70);
        assert!((request.multiplier - 2.0).abs() < f64::EPSILON);
        assert_eq!(request.format, ExportFormat::Png);
        assert_eq!(request.max_dimension, base.max_dimension);

        let capped = ExportOverrides {
            max_dimension: Some(256),
            ..ExportOverrides::default()
        }
        .apply(&base);
        assert_eq!(capped.max_dimension, 256);
    }

    #[test]
    fn test_export_full_content_session() {
        let request = ExportRequest {
            scope: ExportScope::FullContent,
            ..ExportRequest::default()
        };
        let output = export_session(&AppConfig::default(), session_with_card(), &request).unwrap();
        assert_eq!((output.bitmap.width, output.bitmap.height), (440, 340));
        assert_eq!((output.bounds.left, output.bounds.top), (480.0, 480.0));
    }

    #[test]
    fn test_export_visible_area_uses_configured_size() {
        let config = AppConfig {
            viewport_size: Size::new(300.0, 200.0),
            ..AppConfig::default()
        };
        let output =
            export_session(&config, BoardSession::default(), &ExportRequest::default()).unwrap();
        assert_eq!((output.bitmap.width, output.bitmap.height), (300, 200));
    }

    #[test]
    fn test_bounds_of_session() {
        let bounds = session_bounds(&AppConfig::default(), session_with_card()).unwrap();
        assert!(bounds.has_content);
        assert_eq!((bounds.width, bounds.height), (440.0, 340.0));
    }
}

//! Application configuration.

use anyhow::{Context, Result};
use kurbo::Size;
use lessonboard_core::config::EngineConfig;
use lessonboard_render::{CardStyle, ExportRequest};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the command-line exporter.
///
/// Every section is optional in the JSON file; missing values fall back to
/// their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Engine tunables (zoom range, history limit, padding...).
    pub engine: EngineConfig,
    /// Export defaults, overridden per invocation by command-line flags.
    pub export: ExportRequest,
    /// Viewport size used when a session does not record one.
    pub viewport_size: Size,
    /// Appearance of overlay cards in exported bitmaps.
    pub card_style: CardStyle,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            export: ExportRequest::default(),
            viewport_size: Size::new(1280.0, 800.0),
            card_style: CardStyle::default(),
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("parse app config")?;
        config.engine.validate().context("invalid engine config")?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("load config {}", path.display()))
    }
}

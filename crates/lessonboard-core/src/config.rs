//! Engine configuration.

use crate::error::{CoreError, CoreResult};
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Smallest allowed viewport scale.
pub const MIN_SCALE: f64 = 0.25;
/// Largest allowed viewport scale.
pub const MAX_SCALE: f64 = 4.0;
/// Maximum number of history snapshots kept.
pub const HISTORY_LIMIT: usize = 50;
/// Padding added around exported content, in content units.
pub const CONTENT_PADDING: f64 = 20.0;

/// Tunable constants for a whiteboard instance.
///
/// Every field has a default, so a partial JSON document is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum viewport scale.
    pub min_scale: f64,
    /// Maximum viewport scale.
    pub max_scale: f64,
    /// Number of snapshots kept by the history stack.
    pub history_limit: usize,
    /// Padding applied to content bounds on every side.
    pub content_padding: f64,
    /// Extra drawable area added around the minimum-zoom canvas.
    pub canvas_margin: f64,
    /// Zoom factor applied per wheel notch.
    pub wheel_zoom_step: f64,
    /// Minimum overlay card scale.
    pub overlay_min_scale: f64,
    /// Maximum overlay card scale.
    pub overlay_max_scale: f64,
    /// Overlay scale change per wheel notch.
    pub overlay_scale_step: f64,
    /// Rect size reported by an empty surface.
    pub empty_bounds_size: Size,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
            history_limit: HISTORY_LIMIT,
            content_padding: CONTENT_PADDING,
            canvas_margin: 200.0,
            wheel_zoom_step: 1.1,
            overlay_min_scale: 0.5,
            overlay_max_scale: 2.0,
            overlay_scale_step: 0.1,
            empty_bounds_size: Size::new(800.0, 600.0),
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CoreError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot honour.
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.min_scale > 0.0 && self.min_scale <= self.max_scale) {
            return Err(CoreError::InvalidConfig(format!(
                "scale range [{}, {}] is empty or non-positive",
                self.min_scale, self.max_scale
            )));
        }
        if self.history_limit == 0 {
            return Err(CoreError::InvalidConfig("history_limit must be at least 1".into()));
        }
        if self.content_padding < 0.0 || self.canvas_margin < 0.0 {
            return Err(CoreError::InvalidConfig("padding and margin must be non-negative".into()));
        }
        if self.wheel_zoom_step <= 1.0 {
            return Err(CoreError::InvalidConfig("wheel_zoom_step must be greater than 1".into()));
        }
        if !(self.overlay_min_scale > 0.0 && self.overlay_min_scale <= self.overlay_max_scale) {
            return Err(CoreError::InvalidConfig(format!(
                "overlay scale range [{}, {}] is empty or non-positive",
                self.overlay_min_scale, self.overlay_max_scale
            )));
        }
        Ok(())
    }
}

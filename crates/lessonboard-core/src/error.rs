//! Error types for the whiteboard engine.

use thiserror::Error;

/// Errors raised by core operations.
///
/// None of these are fatal: callers recover by keeping the previous state.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Malformed scene document: {0}")]
    MalformedScene(String),
    #[error("Unsupported scene version {found} (expected at most {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("No drawing object with id {0}")]
    UnknownObject(String),
    #[error("No overlay item with id {0}")]
    UnknownOverlay(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::MalformedScene(err.to_string())
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

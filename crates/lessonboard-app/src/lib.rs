//! Lessonboard command-line application.
//!
//! Loads saved board sessions and exports them headlessly.

pub mod commands;
pub mod config;
pub mod session;

pub use commands::{ExportOverrides, export_session, output_path, session_bounds};
pub use config::AppConfig;
pub use session::{BoardSession, ViewportState};

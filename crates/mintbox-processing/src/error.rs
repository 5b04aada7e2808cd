use mintbox_core::{ErrorMetadata, LogLevel};
use thiserror::Error;

/// Drawing and encoding failures.
///
/// These abort a workflow without touching the activity log or status line.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("Drawing surface unavailable: {width}x{height}")]
    SurfaceUnavailable { width: u32, height: u32 },

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Failed to load font: {0}")]
    Font(String),

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Render task failed: {0}")]
    Task(String),
}

impl ErrorMetadata for RenderError {
    fn error_code(&self) -> &'static str {
        match self {
            RenderError::SurfaceUnavailable { .. } => "SURFACE_UNAVAILABLE",
            RenderError::Encode(_) => "ENCODE_ERROR",
            RenderError::Font(_) => "FONT_ERROR",
            RenderError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            RenderError::Task(_) => "RENDER_TASK_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, RenderError::Task(_))
    }

    fn log_level(&self) -> LogLevel {
        match self {
            RenderError::UnsupportedFormat(_) => LogLevel::Debug,
            _ => LogLevel::Error,
        }
    }

    fn writes_activity_log(&self) -> bool {
        false
    }
}

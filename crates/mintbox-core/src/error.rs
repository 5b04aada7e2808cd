//! Error types module
//!
//! Each crate owns its error enum (`StoreError` in mintbox-storage, `RenderError` in
//! mintbox-processing, workflow errors in mintbox-services). They all implement
//! [`ErrorMetadata`] so the editor can decide how to report them without matching on
//! concrete types.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Describes how an error should be reported to the user.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "STORE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether repeating the same action may succeed
    fn is_recoverable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;

    /// Whether the error is appended to the editor's activity log. Errors that are not
    /// logged are reported through the status line only.
    fn writes_activity_log(&self) -> bool {
        true
    }
}

/// Input rejected before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

impl ErrorMetadata for ValidationError {
    fn error_code(&self) -> &'static str {
        match self {
            ValidationError::MissingFields(_) => "MISSING_FIELDS",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Debug
    }

    fn writes_activity_log(&self) -> bool {
        false
    }
}

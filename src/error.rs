//! Centralized error handling for csvsteward.
//!
//! Domain operations (ingest, profile, clean, version store, sessions) return
//! [`Result<T>`] with a [`StewardError`]. Each variant carries a stable
//! machine-readable [`StewardError::kind`] so the HTTP boundary can surface a
//! structured `{ code, message }` body without string matching:
//!
//! ```
//! use csvsteward::error::StewardError;
//!
//! let err = StewardError::ColumnNotFound("age".to_owned());
//! assert_eq!(err.kind(), "column_not_found");
//! assert_eq!(err.to_string(), "Column not found: age");
//! ```
//!
//! The application edges (CLI, logging, config loading) use `anyhow` instead;
//! `StewardError` implements `std::error::Error` so `?` converts it there.

use std::fmt;

/// Main error type for csvsteward operations.
#[derive(Debug)]
pub enum StewardError {
    /// Malformed input file (missing header, ragged rows, bad encoding)
    Format(String),

    /// Referenced file or session has no backing data
    NotFound(String),

    /// Normalize target column is not part of the table
    ColumnNotFound(String),

    /// Request is well-formed but cannot be applied
    Validation(String),

    /// Cleaning was requested against a file that is no longer the session's current version
    StaleVersion { requested: String, current: String },

    /// I/O errors (version files, metadata, temp files)
    Io(std::io::Error),

    /// Polars / dataframe errors
    DataProcessing(String),

    /// Anything else that should never reach a caller as a domain error
    Internal(String),
}

impl StewardError {
    /// Machine-readable error code surfaced at the request boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Format(_) => "format_error",
            Self::NotFound(_) => "not_found",
            Self::ColumnNotFound(_) => "column_not_found",
            Self::Validation(_) => "validation_error",
            Self::StaleVersion { .. } => "stale_version",
            Self::Io(_) | Self::DataProcessing(_) | Self::Internal(_) => "internal",
        }
    }

    /// True for errors caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        self.kind() != "internal"
    }
}

impl fmt::Display for StewardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format(msg) => write!(f, "Invalid file format: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::ColumnNotFound(name) => write!(f, "Column not found: {name}"),
            Self::Validation(msg) => write!(f, "Validation failed: {msg}"),
            Self::StaleVersion { requested, current } => write!(
                f,
                "Stale version: '{requested}' is no longer current (current is '{current}')"
            ),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for StewardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StewardError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<polars::error::PolarsError> for StewardError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

impl From<serde_json::Error> for StewardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {err}"))
    }
}

impl From<csv::Error> for StewardError {
    fn from(err: csv::Error) -> Self {
        Self::Format(err.to_string())
    }
}

impl From<tempfile::PersistError> for StewardError {
    fn from(err: tempfile::PersistError) -> Self {
        Self::Io(err.error)
    }
}

/// Result type alias for csvsteward operations.
pub type Result<T> = std::result::Result<T, StewardError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error. The result is always an internal error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<StewardError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: StewardError = e.into();
            StewardError::Internal(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: StewardError = e.into();
            StewardError::Internal(format!("{}: {}", f(), err))
        })
    }
}

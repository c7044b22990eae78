//! Error types for pubwatch.
//!
//! Library crates use [`PubwatchError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all pubwatch operations.
#[derive(Debug, thiserror::Error)]
pub enum PubwatchError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching an institution page.
    #[error("network error: {0}")]
    Network(String),

    /// HTML parsing or pattern compilation error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Historical store read/write error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad URL, unknown timezone, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Dashboard template is missing.
    #[error("template not found: {0:?}")]
    TemplateMissing(PathBuf),

    /// Dashboard rendering error.
    #[error("render error: {0}")]
    Render(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PubwatchError>;

impl PubwatchError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = PubwatchError::config("unknown timezone 'Mars/Olympus'");
        assert_eq!(err.to_string(), "config error: unknown timezone 'Mars/Olympus'");

        let err = PubwatchError::Network("https://example.com: HTTP 503".into());
        assert!(err.to_string().contains("HTTP 503"));
    }

    #[test]
    fn template_missing_names_the_path() {
        let err = PubwatchError::TemplateMissing(PathBuf::from("dashboard_template.html"));
        assert!(err.to_string().contains("dashboard_template.html"));
    }
}

//! Error types for CoSuJu.
//!
//! Library crates use [`CosujuError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all CoSuJu operations.
#[derive(Debug, thiserror::Error)]
pub enum CosujuError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching a listing, decision page, or document.
    #[error("network error: {0}")]
    Network(String),

    /// HTML parsing error (missing title, unusable link, etc.).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Text extraction failed for a downloaded document.
    #[error("extraction error at {path:?}: {message}")]
    Extraction { path: PathBuf, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad year range, malformed dataset line, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// JSON (de)serialization error for `data.json` or dataset files.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CosujuError>;

impl CosujuError {
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

    /// Create an extraction error for the document at `path`.
    pub fn extraction(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Extraction {
            path: path.into(),
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

impl From<serde_json::Error> for CosujuError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = CosujuError::config("first_year after last_year");
        assert_eq!(err.to_string(), "config error: first_year after last_year");

        let err = CosujuError::validation("line 3 is not a JSON object");
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn extraction_error_names_the_file() {
        let err = CosujuError::extraction("docs/1995/3.pdf", "no text layer");
        let msg = err.to_string();
        assert!(msg.contains("docs/1995/3.pdf"));
        assert!(msg.contains("no text layer"));
    }

    #[test]
    fn json_errors_convert() {
        let bad = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: CosujuError = bad.into();
        assert!(matches!(err, CosujuError::Serialization(_)));
    }
}

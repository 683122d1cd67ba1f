//! Error types for the ETL jobs

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for ETL operations
pub type Result<T> = std::result::Result<T, EtlError>;

/// Main error type for the ETL jobs
///
/// Every variant is fatal to the job that raised it. Callers that need to tell
/// bad input apart from environment failures use [`EtlError::is_format_error`].
#[derive(Error, Debug)]
pub enum EtlError {
    /// Reading or writing a file failed
    #[error("IO error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input data could not be interpreted (bad number, missing field, bad markup)
    #[error("Format error in '{}'{}: {message}", path.display(), line_suffix(*line))]
    Format {
        path: PathBuf,
        line: Option<u64>,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A scraped document did not have the expected structure
    #[error("Parse error: {0}")]
    Parse(String),
}

fn line_suffix(line: Option<u64>) -> String {
    match line {
        Some(line) => format!(" at line {}", line),
        None => String::new(),
    }
}

impl EtlError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn format(path: impl AsRef<Path>, line: Option<u64>, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.as_ref().to_path_buf(),
            line,
            message: message.into(),
        }
    }

    pub fn network(message: impl std::fmt::Display) -> Self {
        Self::Network(message.to_string())
    }

    pub fn database(message: impl std::fmt::Display) -> Self {
        Self::Database(message.to_string())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// True when the failure came from the content of an input rather than
    /// from the environment it was read in
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::Format { .. } | Self::Parse(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_display_with_line() {
        let err = EtlError::format("data/source1.csv", Some(4), "invalid float literal");
        assert_eq!(
            err.to_string(),
            "Format error in 'data/source1.csv' at line 4: invalid float literal"
        );
        assert!(err.is_format_error());
    }

    #[test]
    fn test_format_error_display_without_line() {
        let err = EtlError::format("people.xml", None, "missing <weight>");
        assert_eq!(err.to_string(), "Format error in 'people.xml': missing <weight>");
    }

    #[test]
    fn test_io_error_is_not_format_error() {
        let err = EtlError::io(
            "missing.csv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert!(!err.is_format_error());
        assert!(err.to_string().contains("missing.csv"));
    }
}

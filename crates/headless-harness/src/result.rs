//! Result and error types for the harness.
//!
//! Only conditions that abort a run are errors. Script load errors, test
//! failures and cleanup failures are reported as data on [`crate::RunReport`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors that can abort a test run
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Invalid run configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// A requested coverage report format has no registered writer
    #[error("Unknown coverage report format: {format}")]
    UnknownReportFormat {
        /// Format name as given in `codeCoverage.reportType`
        format: String,
    },

    /// Scratch artifacts could not be prepared
    #[error("Setup failed for {}: {message}", path.display())]
    Setup {
        /// Path that could not be prepared
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Source instrumentation failed
    #[error("Instrumentation of '{name}' failed: {message}")]
    Instrumentation {
        /// Logical name of the application unit
        name: String,
        /// Error message
        message: String,
    },

    /// The emulated document could not be constructed
    #[error("Environment construction for {url} failed: {message}")]
    Environment {
        /// URL the document was bound to
        url: String,
        /// Error message
        message: String,
    },

    /// The test engine failed (distinct from failing tests)
    #[error("Test engine failed: {message}")]
    Engine {
        /// Error message
        message: String,
    },

    /// Coverage could not be collected or written
    #[error("Coverage reporting failed: {message}")]
    Coverage {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl HarnessError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a setup error for a path
    #[must_use]
    pub fn setup(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Setup {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an engine error
    #[must_use]
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
        }
    }

    /// Create a coverage error
    #[must_use]
    pub fn coverage(message: impl Into<String>) -> Self {
        Self::Coverage {
            message: message.into(),
        }
    }

    /// Whether the error happened before any test could execute
    #[must_use]
    pub const fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::UnknownReportFormat { .. }
                | Self::Setup { .. }
                | Self::Instrumentation { .. }
                | Self::Environment { .. }
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_error_mentions_path() {
        let err = HarnessError::setup("/tmp/build/app.js", "permission denied");
        let text = err.to_string();
        assert!(text.contains("/tmp/build/app.js"));
        assert!(text.contains("permission denied"));
        assert!(err.is_setup_failure());
    }

    #[test]
    fn test_engine_error_is_not_setup() {
        let err = HarnessError::engine("runner crashed");
        assert!(err.to_string().contains("Test engine"));
        assert!(!err.is_setup_failure());
    }

    #[test]
    fn test_unknown_format_message() {
        let err = HarnessError::UnknownReportFormat {
            format: "pdf".to_string(),
        };
        assert!(err.to_string().contains("pdf"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: HarnessError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }
}

//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// A coverage dump could not be loaded
    #[error("Cannot load coverage dump {path}: {message}")]
    CoverageDump {
        /// Dump path
        path: String,
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Harness library error
    #[error("{0}")]
    Harness(#[from] headless_harness::HarnessError),
}

impl CliError {
    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harness_error_passes_message_through() {
        let err: CliError = headless_harness::HarnessError::config("buildDir must not be empty").into();
        assert_eq!(
            err.to_string(),
            "Configuration error: buildDir must not be empty"
        );
    }

    #[test]
    fn test_invalid_argument() {
        let err = CliError::invalid_argument("no coverage dumps given");
        assert!(err.to_string().contains("no coverage dumps given"));
    }
}

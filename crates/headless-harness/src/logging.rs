//! Diagnostic logging setup.
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the binary. `RUST_LOG` overrides the verbosity default when set.

use tracing_subscriber::EnvFilter;

/// Logging verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only
    Quiet,
    /// Warnings and errors
    #[default]
    Normal,
    /// Stage boundaries
    Verbose,
    /// Every staged file, removal and dropped console message
    Debug,
}

impl Verbosity {
    /// Verbosity from `-q` and the number of `-v` flags
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Filter directive used when `RUST_LOG` is unset
    #[must_use]
    pub const fn directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
        }
    }
}

/// Install a stderr fmt subscriber.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_logging(verbosity: Verbosity) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}

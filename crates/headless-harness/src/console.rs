//! Host console: where application console output, text coverage reports and
//! done messages end up.

use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError};

/// Line-oriented console of the host process
pub trait HostConsole: Debug + Send + Sync {
    /// Print a line to standard output
    fn log(&self, line: &str);

    /// Print a line to standard error
    fn error(&self, line: &str) {
        self.log(line);
    }
}

/// Console writing to the process's stdout/stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutConsole;

impl HostConsole for StdoutConsole {
    fn log(&self, line: &str) {
        println!("{line}");
    }

    fn error(&self, line: &str) {
        eprintln!("{line}");
    }
}

/// Stream a captured line was written to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    /// Standard output
    Out,
    /// Standard error
    Err,
}

/// Console that records every line, for assertions
#[derive(Debug, Clone, Default)]
pub struct CapturedConsole {
    lines: Arc<Mutex<Vec<(Stream, String)>>>,
}

impl CapturedConsole {
    /// Create an empty capture
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, stream: Stream, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((stream, line.to_string()));
    }

    /// Every line, both streams, in write order
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, line)| line.clone())
            .collect()
    }

    /// Lines written to one stream
    #[must_use]
    pub fn stream(&self, stream: Stream) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(s, _)| *s == stream)
            .map(|(_, line)| line.clone())
            .collect()
    }

    /// How many times exactly this line was written
    #[must_use]
    pub fn count(&self, line: &str) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, l)| l == line)
            .count()
    }
}

impl HostConsole for CapturedConsole {
    fn log(&self, line: &str) {
        self.push(Stream::Out, line);
    }

    fn error(&self, line: &str) {
        self.push(Stream::Err, line);
    }
}

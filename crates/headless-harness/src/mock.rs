//! In-memory collaborators.
//!
//! - `MockEnvironment` / `MockWindow` - document construction without a DOM
//! - `MockTestEngine` - canned run results, records what it was given
//! - `MockInstrumenter` - tags sources instead of rewriting them
//!
//! Every mock can share an [`EventLog`] so tests can assert the order in which
//! the pipeline touched its collaborators. Clones share their recorded state.

use crate::engine::{RunStats, TestContext, TestEngine, TestSuite};
use crate::environment::{
    ConsoleMessage, DomEvent, EnvironmentFactory, EnvironmentRequest, LoadedDocument,
    ScriptError, Window, COVERAGE_GLOBAL,
};
use crate::instrument::Instrumenter;
use crate::result::{HarnessError, HarnessResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Ordered record of pipeline events, shared between mocks and hooks
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event
    pub fn record(&self, event: impl Into<String>) {
        lock(&self.events).push(event.into());
    }

    /// Every event in order
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        lock(&self.events).clone()
    }

    /// Index of the first occurrence of `event`
    #[must_use]
    pub fn position(&self, event: &str) -> Option<usize> {
        lock(&self.events).iter().position(|e| e == event)
    }

    /// Occurrences of `event`
    #[must_use]
    pub fn count(&self, event: &str) -> usize {
        lock(&self.events).iter().filter(|e| *e == event).count()
    }
}

/// Window backed by a map of JSON globals
#[derive(Debug, Clone, Default)]
pub struct MockWindow {
    url: String,
    globals: Arc<Mutex<BTreeMap<String, serde_json::Value>>>,
    dispatched: Arc<Mutex<Vec<DomEvent>>>,
    log: EventLog,
}

impl MockWindow {
    /// Window bound to `url`
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Record dispatches in `log`
    #[must_use]
    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = log;
        self
    }

    /// Events dispatched so far
    #[must_use]
    pub fn dispatched(&self) -> Vec<DomEvent> {
        lock(&self.dispatched).clone()
    }
}

impl Window for MockWindow {
    fn url(&self) -> &str {
        &self.url
    }

    fn global(&self, name: &str) -> Option<serde_json::Value> {
        lock(&self.globals).get(name).cloned()
    }

    fn set_global(&mut self, name: &str, value: serde_json::Value) {
        lock(&self.globals).insert(name.to_string(), value);
    }

    fn dispatch_event(&mut self, event: &DomEvent) -> HarnessResult<()> {
        self.log.record(format!("event:{}", event.kind));
        lock(&self.dispatched).push(event.clone());
        Ok(())
    }
}

/// Environment factory producing [`MockWindow`]s
#[derive(Debug, Clone, Default)]
pub struct MockEnvironment {
    failure: Option<String>,
    script_errors: Vec<ScriptError>,
    globals: BTreeMap<String, serde_json::Value>,
    console_messages: Vec<ConsoleMessage>,
    requests: Arc<Mutex<Vec<EnvironmentRequest>>>,
    dispatched: Arc<Mutex<Vec<DomEvent>>>,
    log: EventLog,
}

impl MockEnvironment {
    /// Factory that always succeeds
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory whose URL resource cannot be reached
    #[must_use]
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Report a non-fatal script error on load
    #[must_use]
    pub fn with_script_error(mut self, error: ScriptError) -> Self {
        self.script_errors.push(error);
        self
    }

    /// Define a global on every window created
    #[must_use]
    pub fn with_global(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.globals.insert(name.into(), value);
        self
    }

    /// Emit a console message while loading
    #[must_use]
    pub fn with_console_message(mut self, message: ConsoleMessage) -> Self {
        self.console_messages.push(message);
        self
    }

    /// Record construction and dispatches in `log`
    #[must_use]
    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = log;
        self
    }

    /// Requests received so far
    #[must_use]
    pub fn requests(&self) -> Vec<EnvironmentRequest> {
        lock(&self.requests).clone()
    }

    /// Events dispatched on any window this factory created
    #[must_use]
    pub fn dispatched(&self) -> Vec<DomEvent> {
        lock(&self.dispatched).clone()
    }
}

#[async_trait]
impl EnvironmentFactory for MockEnvironment {
    async fn create(&self, request: EnvironmentRequest) -> HarnessResult<LoadedDocument> {
        self.log.record("environment:create");
        lock(&self.requests).push(request.clone());

        if let Some(message) = &self.failure {
            return Err(HarnessError::Environment {
                url: request.url,
                message: message.clone(),
            });
        }

        for message in &self.console_messages {
            request.console.emit(message);
        }

        let window = MockWindow {
            url: request.url,
            globals: Arc::new(Mutex::new(self.globals.clone())),
            dispatched: Arc::clone(&self.dispatched),
            log: self.log.clone(),
        };
        Ok(LoadedDocument {
            window: Box::new(window),
            script_errors: self.script_errors.clone(),
        })
    }
}

/// What a [`MockTestEngine`] was asked to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRun {
    /// Suite as received
    pub suite: TestSuite,
    /// Contents of each staged file at run time
    pub contents: Vec<String>,
    /// Ambient bindings as received
    pub context: TestContext,
}

/// Engine returning canned stats
#[derive(Debug, Clone, Default)]
pub struct MockTestEngine {
    stats: RunStats,
    error: Option<String>,
    coverage: Option<serde_json::Value>,
    runs: Arc<Mutex<Vec<EngineRun>>>,
    log: EventLog,
}

impl MockTestEngine {
    /// Engine where every test passes
    #[must_use]
    pub fn passing(passes: u32) -> Self {
        Self {
            stats: RunStats {
                passes,
                ..RunStats::default()
            },
            ..Self::default()
        }
    }

    /// Engine reporting `failures` failed tests
    #[must_use]
    pub fn failing(failures: u32) -> Self {
        Self {
            stats: RunStats::with_failures(failures),
            ..Self::default()
        }
    }

    /// Engine that breaks instead of reporting
    #[must_use]
    pub fn broken(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Publish `coverage` on the window while running, as instrumented code does
    #[must_use]
    pub fn with_coverage(mut self, coverage: serde_json::Value) -> Self {
        self.coverage = Some(coverage);
        self
    }

    /// Record runs in `log`
    #[must_use]
    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = log;
        self
    }

    /// Runs received so far
    #[must_use]
    pub fn runs(&self) -> Vec<EngineRun> {
        lock(&self.runs).clone()
    }
}

#[async_trait]
impl TestEngine for MockTestEngine {
    async fn run(
        &mut self,
        suite: &TestSuite,
        context: &TestContext,
        window: &mut dyn Window,
    ) -> HarnessResult<RunStats> {
        self.log.record("engine:run");

        let contents = suite
            .files
            .iter()
            .map(|path| {
                std::fs::read_to_string(path).map_err(|e| {
                    HarnessError::engine(format!("cannot load {}: {e}", path.display()))
                })
            })
            .collect::<HarnessResult<Vec<_>>>()?;
        lock(&self.runs).push(EngineRun {
            suite: suite.clone(),
            contents,
            context: context.clone(),
        });

        if let Some(coverage) = &self.coverage {
            window.set_global(COVERAGE_GLOBAL, coverage.clone());
        }
        match &self.error {
            Some(message) => Err(HarnessError::engine(message.clone())),
            None => Ok(self.stats),
        }
    }
}

/// Instrumenter that prefixes a marker naming the persisted unit
#[derive(Debug, Clone, Default)]
pub struct MockInstrumenter {
    fail_on: Option<String>,
    calls: Arc<Mutex<Vec<(PathBuf, bool)>>>,
}

impl MockInstrumenter {
    /// Instrumenter that always succeeds
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail for the unit with this logical name
    #[must_use]
    pub fn failing_on(name: impl Into<String>) -> Self {
        Self {
            fail_on: Some(name.into()),
            ..Self::default()
        }
    }

    /// `(path, persisted before the call)` for every call
    #[must_use]
    pub fn calls(&self) -> Vec<(PathBuf, bool)> {
        lock(&self.calls).clone()
    }
}

impl Instrumenter for MockInstrumenter {
    fn instrument(&self, source: &str, path: &Path) -> HarnessResult<String> {
        lock(&self.calls).push((path.to_path_buf(), path.exists()));

        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        if self.fail_on.as_deref() == Some(stem) {
            return Err(HarnessError::Instrumentation {
                name: stem.to_string(),
                message: "unexpected token".to_string(),
            });
        }
        let file_name = path.file_name().and_then(|s| s.to_str()).unwrap_or_default();
        Ok(format!("/* instrumented: {file_name} */{source}"))
    }
}

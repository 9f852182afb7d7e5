//! Test run pipeline.
//!
//! ```text
//! validate → assemble (instrument) → construct environment → setup hook
//!          → stage test files → DOMContentLoaded → engine run
//!          → done(success) → coverage reports → cleanup
//! ```
//!
//! Errors before the engine reports abort the run without calling `done`;
//! staged files are still removed by the [`StagedFiles`] guard.

use crate::assembler::assemble_sources;
use crate::config::RunConfig;
use crate::console::{HostConsole, StdoutConsole};
use crate::coverage::{aggregate, ReportRegistry, WrittenReport};
use crate::engine::{stage_suite, RunStats, TestContext, TestEngine};
use crate::environment::{
    bootstrap, signal_ready, EnvironmentFactory, EnvironmentRequest, LoadedDocument, ScriptError,
    VirtualConsole, Window, BASE_HTML,
};
use crate::instrument::{Instrumenter, NoopInstrumenter};
use crate::result::HarnessResult;
use crate::temp_files::{ensure_dir, CleanupOutcome, StagedFiles};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

type SetupHook = Box<dyn FnOnce(&mut dyn Window) + Send>;
type DoneHook = Box<dyn FnOnce(bool) + Send>;

/// Caller callbacks for one run
#[derive(Default)]
pub struct RunHooks {
    setup: Option<SetupHook>,
    done: Option<DoneHook>,
}

impl fmt::Debug for RunHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunHooks")
            .field("setup", &self.setup.is_some())
            .field("done", &self.done.is_some())
            .finish()
    }
}

impl RunHooks {
    /// No callbacks
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the window once the document is ready, before staging
    #[must_use]
    pub fn on_setup(mut self, hook: impl FnOnce(&mut dyn Window) + Send + 'static) -> Self {
        self.setup = Some(Box::new(hook));
        self
    }

    /// Called once with the run's success, before coverage and cleanup
    #[must_use]
    pub fn on_done(mut self, hook: impl FnOnce(bool) + Send + 'static) -> Self {
        self.done = Some(Box::new(hook));
        self
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// True iff no test failed
    pub success: bool,
    /// Engine counts
    pub stats: RunStats,
    /// Non-fatal errors raised while loading scripts
    pub script_errors: Vec<ScriptError>,
    /// Coverage reports written
    pub reports: Vec<WrittenReport>,
    /// Removal outcome of every staged test file
    pub cleanup: Vec<CleanupOutcome>,
}

/// External collaborators of a run
#[derive(Debug)]
pub struct Collaborators {
    /// Builds the emulated document
    pub environment: Arc<dyn EnvironmentFactory>,
    /// Executes the test files
    pub engine: Box<dyn TestEngine>,
    /// Instruments application sources when coverage is active
    pub instrumenter: Arc<dyn Instrumenter>,
    /// Receives application console output, text reports and done messages
    pub console: Arc<dyn HostConsole>,
}

/// Orchestrates one test run
#[derive(Debug)]
pub struct Harness {
    environment: Arc<dyn EnvironmentFactory>,
    engine: Box<dyn TestEngine>,
    instrumenter: Arc<dyn Instrumenter>,
    console: Arc<dyn HostConsole>,
    registry: ReportRegistry,
    context: TestContext,
    hooks: RunHooks,
}

impl Harness {
    /// Harness with the built-in report writers, default ambient bindings,
    /// no instrumentation and the process console
    #[must_use]
    pub fn new(
        environment: impl EnvironmentFactory + 'static,
        engine: impl TestEngine + 'static,
    ) -> Self {
        Self::from_collaborators(Collaborators {
            environment: Arc::new(environment),
            engine: Box::new(engine),
            instrumenter: Arc::new(NoopInstrumenter),
            console: Arc::new(StdoutConsole),
        })
    }

    /// Harness over already boxed collaborators
    #[must_use]
    pub fn from_collaborators(collaborators: Collaborators) -> Self {
        Self {
            environment: collaborators.environment,
            engine: collaborators.engine,
            instrumenter: collaborators.instrumenter,
            console: collaborators.console,
            registry: ReportRegistry::default(),
            context: TestContext::default(),
            hooks: RunHooks::default(),
        }
    }

    /// Set the coverage instrumenter
    #[must_use]
    pub fn with_instrumenter(mut self, instrumenter: impl Instrumenter + 'static) -> Self {
        self.instrumenter = Arc::new(instrumenter);
        self
    }

    /// Set the host console
    #[must_use]
    pub fn with_console(mut self, console: Arc<dyn HostConsole>) -> Self {
        self.console = console;
        self
    }

    /// Replace the report writers
    #[must_use]
    pub fn with_registry(mut self, registry: ReportRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the ambient test bindings
    #[must_use]
    pub fn with_context(mut self, context: TestContext) -> Self {
        self.context = context;
        self
    }

    /// Replace both hooks
    #[must_use]
    pub fn with_hooks(mut self, hooks: RunHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// See [`RunHooks::on_setup`]
    #[must_use]
    pub fn on_setup(mut self, hook: impl FnOnce(&mut dyn Window) + Send + 'static) -> Self {
        self.hooks = self.hooks.on_setup(hook);
        self
    }

    /// See [`RunHooks::on_done`]
    #[must_use]
    pub fn on_done(mut self, hook: impl FnOnce(bool) + Send + 'static) -> Self {
        self.hooks = self.hooks.on_done(hook);
        self
    }

    /// Run the suite described by `config`.
    ///
    /// A coverage failure is returned after `done` fired and staged files were
    /// removed.
    ///
    /// # Errors
    ///
    /// Setup, environment and engine failures abort the run before `done`.
    pub async fn run_tests(mut self, config: &RunConfig) -> HarnessResult<RunReport> {
        let started = Instant::now();
        config.validate()?;
        let coverage = config.code_coverage.active;
        if coverage {
            self.registry.ensure_known(&config.code_coverage.report_type)?;
        }
        tracing::info!(
            url = %config.url,
            test_files = config.test_files.len(),
            coverage,
            "starting test run"
        );

        ensure_dir(&config.build_dir)?;
        if coverage {
            ensure_dir(config.coverage_dir())?;
        }

        let scripts = assemble_sources(
            &config.app_source,
            coverage,
            &config.build_dir,
            self.instrumenter.as_ref(),
        )?;
        let request = EnvironmentRequest {
            url: config.url.clone(),
            html: BASE_HTML.to_string(),
            scripts,
            console: VirtualConsole::new(Arc::clone(&self.console)),
        };
        let LoadedDocument {
            mut window,
            script_errors,
        } = bootstrap(self.environment.as_ref(), request).await?;

        if let Some(setup) = self.hooks.setup.take() {
            setup(&mut *window);
        }

        let mut staged = StagedFiles::new();
        let suite = stage_suite(config, &mut staged)?;
        signal_ready(&mut *window)?;

        let stats = self.engine.run(&suite, &self.context, &mut *window).await?;
        let success = stats.success();
        tracing::info!(
            passes = stats.passes,
            failures = stats.failures,
            pending = stats.pending,
            "test engine finished"
        );

        if let Some(done) = self.hooks.done.take() {
            done(success);
        }

        let reports = if coverage {
            aggregate(&*window, config, &self.registry, self.console.as_ref())
        } else {
            Ok(Vec::new())
        };

        let cleanup = staged.cleanup();
        for outcome in &cleanup {
            tracing::debug!(?outcome, "temp file cleanup");
        }
        let reports = reports?;

        tracing::info!(
            success,
            elapsed = ?started.elapsed(),
            "test run complete"
        );
        Ok(RunReport {
            success,
            stats,
            script_errors,
            reports,
            cleanup,
        })
    }
}

/// Run `config` with the given hooks and collaborators
///
/// # Errors
///
/// See [`Harness::run_tests`].
pub async fn run_tests(
    config: &RunConfig,
    hooks: RunHooks,
    collaborators: Collaborators,
) -> HarnessResult<RunReport> {
    Harness::from_collaborators(collaborators)
        .with_hooks(hooks)
        .run_tests(config)
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::console::CapturedConsole;
    use crate::environment::DOM_CONTENT_LOADED;
    use crate::mock::{EventLog, MockEnvironment, MockTestEngine};
    use crate::result::HarnessError;

    fn traced_harness(log: &EventLog, engine: MockTestEngine) -> Harness {
        let setup_log = log.clone();
        let done_log = log.clone();
        Harness::new(
            MockEnvironment::new().with_log(log.clone()),
            engine.with_log(log.clone()),
        )
        .with_console(Arc::new(CapturedConsole::new()))
        .on_setup(move |_| setup_log.record("setup"))
        .on_done(move |ok| done_log.record(format!("done:{ok}")))
    }

    #[tokio::test]
    async fn test_pipeline_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new();
        let config = RunConfig::new(dir.path());

        let report = traced_harness(&log, MockTestEngine::passing(1))
            .run_tests(&config)
            .await
            .unwrap();

        assert!(report.success);
        assert_eq!(
            log.events(),
            vec![
                "environment:create".to_string(),
                "setup".to_string(),
                format!("event:{DOM_CONTENT_LOADED}"),
                "engine:run".to_string(),
                "done:true".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_failures_report_unsuccessful() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new();

        let report = traced_harness(&log, MockTestEngine::failing(2))
            .run_tests(&RunConfig::new(dir.path()))
            .await
            .unwrap();

        assert!(!report.success);
        assert_eq!(report.stats.failures, 2);
        assert_eq!(log.count("done:false"), 1);
    }

    #[tokio::test]
    async fn test_engine_error_skips_done() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new();

        let err = traced_harness(&log, MockTestEngine::broken("mocha crashed"))
            .run_tests(&RunConfig::new(dir.path()))
            .await
            .unwrap_err();

        assert!(matches!(err, HarnessError::Engine { .. }));
        assert_eq!(log.position("done:true"), None);
        assert_eq!(log.position("done:false"), None);
    }

    #[tokio::test]
    async fn test_unknown_format_fails_before_environment() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new();
        let config = RunConfig::builder(dir.path()).coverage(["pdf"]).build();

        let err = traced_harness(&log, MockTestEngine::passing(0))
            .run_tests(&config)
            .await
            .unwrap_err();

        assert!(err.is_setup_failure());
        assert!(log.events().is_empty());
    }

    #[test]
    fn test_hooks_debug_hides_closures() {
        let hooks = RunHooks::new().on_done(|_| {});
        assert_eq!(
            format!("{hooks:?}"),
            "RunHooks { setup: false, done: true }"
        );
    }
}

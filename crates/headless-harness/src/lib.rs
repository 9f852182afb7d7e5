//! Headless Harness: browser-dependent JavaScript test suites without a browser
//!
//! One run builds an emulated document, loads the application scripts into it
//! (instrumented for coverage when requested), stages the test files, lets a
//! test engine execute them, and finally reports pass/fail and coverage while
//! removing every generated artifact.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌─────────────┐   ┌────────────┐   ┌────────────┐
//! │ RunConfig  │──►│ Assembler  │──►│ Environment │──►│ TestEngine │──►│ Completion │
//! │            │   │ (+ instr.) │   │ (Window)    │   │ (staged)   │   │ (coverage) │
//! └────────────┘   └────────────┘   └─────────────┘   └────────────┘   └────────────┘
//! ```
//!
//! The DOM emulation, the test engine and the instrumenter are collaborators
//! behind [`EnvironmentFactory`], [`TestEngine`] and [`Instrumenter`]; the
//! [`mock`] module has in-memory implementations.
//!
//! ```no_run
//! use headless_harness::mock::{MockEnvironment, MockTestEngine};
//! use headless_harness::{Harness, RunConfig};
//!
//! # async fn demo() -> headless_harness::HarnessResult<()> {
//! let config = RunConfig::builder("build")
//!     .test_file("test/app.spec.js")
//!     .coverage(["lcov"])
//!     .done_message("lcov", "LCOV report written")
//!     .build();
//!
//! let report = Harness::new(MockEnvironment::new(), MockTestEngine::passing(1))
//!     .on_done(|success| println!("success: {success}"))
//!     .run_tests(&config)
//!     .await?;
//! assert!(report.success);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::float_cmp))]

pub mod assembler;
pub mod config;
pub mod console;
pub mod coverage;
pub mod engine;
pub mod environment;
mod harness;
pub mod instrument;
pub mod logging;
pub mod mock;
mod result;
pub mod temp_files;

pub use assembler::{assemble_sources, AssembledScripts, ScriptOrigin, ScriptUnit};
pub use config::{
    AppScript, AppSources, CoverageOptions, Interface, Reporter, ResolvedRunnerOptions,
    RunConfig, RunConfigBuilder, RunnerOptions, SourceBundle, DEFAULT_TIMEOUT_MS, DEFAULT_URL,
};
pub use console::{CapturedConsole, HostConsole, StdoutConsole, Stream};
pub use coverage::{
    aggregate, write_reports, Collector, CoverageMap, CoverageSummary, FileCoverage,
    ReportRegistry, ReportWriter, WrittenReport,
};
pub use engine::{AmbientBinding, RunStats, TestContext, TestEngine, TestSuite};
pub use environment::{
    ConsoleLevel, ConsoleMessage, DomEvent, EnvironmentFactory, EnvironmentRequest,
    LoadedDocument, MessageOrigin, ScriptError, VirtualConsole, Window,
};
pub use harness::{run_tests, Collaborators, Harness, RunHooks, RunReport};
pub use instrument::{Instrumenter, NoopInstrumenter};
pub use logging::{init_logging, Verbosity};
pub use result::{HarnessError, HarnessResult};
pub use temp_files::{CleanupOutcome, StagedFiles, TempFile};

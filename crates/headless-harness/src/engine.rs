//! Test run driver.
//!
//! Test files are staged (injection text + original contents) under derived
//! names and handed to a [`TestEngine`] together with a [`TestContext`] that
//! carries the ambient test helpers. Helpers are passed explicitly into every
//! file's scope instead of being assigned to a process-wide global object, so
//! two runs in the same process cannot clobber each other.

use crate::config::{ResolvedRunnerOptions, RunConfig};
use crate::environment::Window;
use crate::result::HarnessResult;
use crate::temp_files::StagedFiles;
use async_trait::async_trait;
use std::fmt::Debug;
use std::path::PathBuf;
use std::time::Duration;

/// Identifier bound in every test file's scope and what provides it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbientBinding {
    /// Identifier test files refer to
    pub name: String,
    /// Library entry point the engine resolves it to
    pub provider: String,
}

/// Ambient helpers available to test files without imports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestContext {
    bindings: Vec<AmbientBinding>,
}

impl Default for TestContext {
    /// `assert` (chai with spies and sinon-chai), `sinon` and a `Promise`
    /// polyfill
    fn default() -> Self {
        Self::empty()
            .with_binding("assert", "chai.assert+chai-spies+sinon-chai")
            .with_binding("sinon", "sinon")
            .with_binding("Promise", "es6-promise")
    }
}

impl TestContext {
    /// Context without bindings
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Add a binding, replacing any binding with the same name
    #[must_use]
    pub fn with_binding(mut self, name: impl Into<String>, provider: impl Into<String>) -> Self {
        let name = name.into();
        let provider = provider.into();
        match self.bindings.iter_mut().find(|b| b.name == name) {
            Some(existing) => existing.provider = provider,
            None => self.bindings.push(AmbientBinding { name, provider }),
        }
        self
    }

    /// Provider bound to `name`
    #[must_use]
    pub fn provider(&self, name: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.provider.as_str())
    }

    /// All bindings in declaration order
    #[must_use]
    pub fn bindings(&self) -> &[AmbientBinding] {
        &self.bindings
    }
}

/// Files and options for one engine run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSuite {
    /// Engine options with defaults applied
    pub options: ResolvedRunnerOptions,
    /// Staged test files, in queue order
    pub files: Vec<PathBuf>,
}

/// Counts reported by the engine when it finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Passing tests
    pub passes: u32,
    /// Failing tests
    pub failures: u32,
    /// Pending (skipped) tests
    pub pending: u32,
    /// Wall time of the engine run
    pub duration: Duration,
}

impl RunStats {
    /// Stats with only a failure count
    #[must_use]
    pub fn with_failures(failures: u32) -> Self {
        Self {
            failures,
            ..Self::default()
        }
    }

    /// True iff no test failed
    #[must_use]
    pub const fn success(&self) -> bool {
        self.failures == 0
    }
}

/// Executes test files against a prepared document
#[async_trait]
pub trait TestEngine: Debug + Send {
    /// Run every file of the suite and report the counts.
    ///
    /// Failing tests are not an error; `Err` means the engine itself broke.
    async fn run(
        &mut self,
        suite: &TestSuite,
        context: &TestContext,
        window: &mut dyn Window,
    ) -> HarnessResult<RunStats>;
}

/// Stage every test file of `config` and describe the suite.
///
/// Staged files are tracked by `staged`, which removes them on cleanup.
pub fn stage_suite(config: &RunConfig, staged: &mut StagedFiles) -> HarnessResult<TestSuite> {
    for file in &config.test_files {
        staged.stage(&config.build_dir, file, &config.injection)?;
    }
    Ok(TestSuite {
        options: config.mocha_opts.resolved(),
        files: staged.paths(),
    })
}

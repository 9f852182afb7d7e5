//! Run Configuration
//!
//! The single input aggregate of a test run. Field names on the wire follow the
//! camelCase option names (`testFiles`, `mochaOpts`, `codeCoverage`, ...), so a
//! YAML or JSON run file maps one-to-one onto [`RunConfig`].

use crate::result::{HarnessError, HarnessResult};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Per-test timeout applied when `mochaOpts.timeout` is omitted or zero
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;

/// URL the emulated document is bound to when none is configured
pub const DEFAULT_URL: &str = "about:blank";

/// Console reporting style of the test engine
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Reporter {
    /// One character per test
    #[default]
    Dot,
    /// Hierarchical spec listing
    Spec,
    /// Summary only
    Min,
    /// Test Anything Protocol
    Tap,
    /// Single JSON document
    Json,
    /// Progress bar
    Progress,
    /// Reporter known only to the engine
    Other(String),
}

impl Reporter {
    /// Engine-facing name
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Dot => "dot",
            Self::Spec => "spec",
            Self::Min => "min",
            Self::Tap => "tap",
            Self::Json => "json",
            Self::Progress => "progress",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Reporter {
    fn from(name: String) -> Self {
        match name.as_str() {
            "dot" => Self::Dot,
            "spec" => Self::Spec,
            "min" => Self::Min,
            "tap" => Self::Tap,
            "json" => Self::Json,
            "progress" => Self::Progress,
            _ => Self::Other(name),
        }
    }
}

impl From<Reporter> for String {
    fn from(reporter: Reporter) -> Self {
        reporter.as_str().to_string()
    }
}

/// Test interface style (how test files declare suites)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Interface {
    /// `describe` / `it`
    #[default]
    Bdd,
    /// `suite` / `test`
    Tdd,
    /// QUnit-style flat suites
    Qunit,
    /// Exported object literals
    Exports,
    /// Interface known only to the engine
    Other(String),
}

impl Interface {
    /// Engine-facing name
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Bdd => "bdd",
            Self::Tdd => "tdd",
            Self::Qunit => "qunit",
            Self::Exports => "exports",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Interface {
    fn from(name: String) -> Self {
        match name.as_str() {
            "bdd" => Self::Bdd,
            "tdd" => Self::Tdd,
            "qunit" => Self::Qunit,
            "exports" => Self::Exports,
            _ => Self::Other(name),
        }
    }
}

impl From<Interface> for String {
    fn from(interface: Interface) -> Self {
        interface.as_str().to_string()
    }
}

/// Test engine options as supplied by the caller (`mochaOpts`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerOptions {
    /// Per-test timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Reporting style
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter: Option<Reporter>,
    /// Interface style
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<Interface>,
}

impl RunnerOptions {
    /// Apply defaults for every omitted option.
    ///
    /// A zero timeout counts as omitted.
    #[must_use]
    pub fn resolved(&self) -> ResolvedRunnerOptions {
        ResolvedRunnerOptions {
            timeout: Duration::from_millis(
                self.timeout
                    .filter(|ms| *ms > 0)
                    .unwrap_or(DEFAULT_TIMEOUT_MS),
            ),
            reporter: self.reporter.clone().unwrap_or_default(),
            interface: self.spec.clone().unwrap_or_default(),
        }
    }
}

/// Test engine options with defaults applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRunnerOptions {
    /// Per-test timeout
    pub timeout: Duration,
    /// Reporting style
    pub reporter: Reporter,
    /// Interface style
    pub interface: Interface,
}

/// Coverage options (`codeCoverage`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageOptions {
    /// Instrument application sources and write reports
    #[serde(default)]
    pub active: bool,
    /// Report formats to write, in order
    #[serde(default)]
    pub report_type: Vec<String>,
    /// Report directory; the build directory when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// One named application script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppScript {
    /// Logical name, also the stem of the persisted file
    pub name: String,
    /// Script source text
    pub source: String,
}

/// Application scripts keyed by logical name, in insertion order.
///
/// Serialized as a map; deserialization keeps the document order of the keys,
/// which is the order scripts execute in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppSources {
    entries: Vec<AppScript>,
}

impl AppSources {
    /// Create an empty map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a script. Re-inserting a name replaces its source in place.
    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        let name = name.into();
        let source = source.into();
        if let Some(existing) = self.entries.iter_mut().find(|e| e.name == name) {
            existing.source = source;
        } else {
            self.entries.push(AppScript { name, source });
        }
    }

    /// Look up a script by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.source.as_str())
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &AppScript> {
        self.entries.iter()
    }

    /// Logical names in insertion order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Number of scripts
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no scripts
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>, S: Into<String>> FromIterator<(N, S)> for AppSources {
    fn from_iter<I: IntoIterator<Item = (N, S)>>(iter: I) -> Self {
        let mut sources = Self::new();
        for (name, source) in iter {
            sources.insert(name, source);
        }
        sources
    }
}

impl Serialize for AppSources {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.name, &entry.source)?;
        }
        map.end()
    }
}

struct AppSourcesVisitor;

impl<'de> Visitor<'de> for AppSourcesVisitor {
    type Value = AppSources;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of script name to source text")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut sources = AppSources::new();
        while let Some((name, source)) = access.next_entry::<String, String>()? {
            sources.insert(name, source);
        }
        Ok(sources)
    }
}

impl<'de> Deserialize<'de> for AppSources {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(AppSourcesVisitor)
    }
}

/// Scripts loaded into the document: prefix, application, suffix
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceBundle {
    /// Loaded before the application scripts
    #[serde(default)]
    pub prefix: Vec<String>,
    /// Application scripts; instrumented when coverage is active
    #[serde(default)]
    pub app: AppSources,
    /// Loaded after the application scripts
    #[serde(default)]
    pub suffix: Vec<String>,
}

/// Configuration for one test run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    /// Test files, in queue order
    #[serde(default)]
    pub test_files: Vec<PathBuf>,
    /// Test engine options
    #[serde(default)]
    pub mocha_opts: RunnerOptions,
    /// Coverage options
    #[serde(default)]
    pub code_coverage: CoverageOptions,
    /// Scripts loaded into the document
    #[serde(default)]
    pub app_source: SourceBundle,
    /// Text prepended to every test file
    #[serde(default)]
    pub injection: String,
    /// Scratch directory for every generated artifact
    pub build_dir: PathBuf,
    /// URL the document is bound to
    #[serde(default = "default_url")]
    pub url: String,
    /// Console message per report format, printed after reports are written
    #[serde(default)]
    pub done_message: BTreeMap<String, String>,
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

impl RunConfig {
    /// Create a configuration with only the build directory set
    #[must_use]
    pub fn new(build_dir: impl Into<PathBuf>) -> Self {
        Self {
            test_files: Vec::new(),
            mocha_opts: RunnerOptions::default(),
            code_coverage: CoverageOptions::default(),
            app_source: SourceBundle::default(),
            injection: String::new(),
            build_dir: build_dir.into(),
            url: default_url(),
            done_message: BTreeMap::new(),
        }
    }

    /// Create a builder
    #[must_use]
    pub fn builder(build_dir: impl Into<PathBuf>) -> RunConfigBuilder {
        RunConfigBuilder {
            config: Self::new(build_dir),
        }
    }

    /// Parse a YAML (or JSON) document
    pub fn from_yaml_str(text: &str) -> HarnessResult<Self> {
        let config: Self = serde_yaml_ng::from_str(text)?;
        Ok(config)
    }

    /// Load a run file. `.json` files are parsed as JSON, anything else as YAML.
    ///
    /// A relative `buildDir` or `codeCoverage.dir` is resolved against the run
    /// file's directory.
    pub fn from_path(path: &Path) -> HarnessResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&text)?
        } else {
            Self::from_yaml_str(&text)?
        };
        if let Some(parent) = path.parent() {
            if config.build_dir.is_relative() {
                config.build_dir = parent.join(&config.build_dir);
            }
            if let Some(dir) = config.code_coverage.dir.as_mut() {
                if dir.is_relative() {
                    *dir = parent.join(&*dir);
                }
            }
        }
        Ok(config)
    }

    /// Directory coverage reports are written to
    #[must_use]
    pub fn coverage_dir(&self) -> &Path {
        self.code_coverage
            .dir
            .as_deref()
            .unwrap_or(self.build_dir.as_path())
    }

    /// Check invariants that do not depend on collaborators.
    ///
    /// Application names become file names under the build directory, so they
    /// must be plain file stems.
    pub fn validate(&self) -> HarnessResult<()> {
        if self.build_dir.as_os_str().is_empty() {
            return Err(HarnessError::config("buildDir must not be empty"));
        }
        for name in self.app_source.app.names() {
            if name.is_empty()
                || name == "."
                || name == ".."
                || name.contains(['/', '\\'])
            {
                return Err(HarnessError::config(format!(
                    "application script name '{name}' is not a plain file name"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for [`RunConfig`]
#[derive(Debug, Clone)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    /// Add a test file
    #[must_use]
    pub fn test_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.test_files.push(path.into());
        self
    }

    /// Set per-test timeout in milliseconds
    #[must_use]
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.mocha_opts.timeout = Some(ms);
        self
    }

    /// Set reporter
    #[must_use]
    pub fn reporter(mut self, reporter: Reporter) -> Self {
        self.config.mocha_opts.reporter = Some(reporter);
        self
    }

    /// Set interface style
    #[must_use]
    pub fn interface(mut self, interface: Interface) -> Self {
        self.config.mocha_opts.spec = Some(interface);
        self
    }

    /// Enable coverage with the given report formats
    #[must_use]
    pub fn coverage<I, S>(mut self, report_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.code_coverage.active = true;
        self.config.code_coverage.report_type = report_types.into_iter().map(Into::into).collect();
        self
    }

    /// Set coverage report directory
    #[must_use]
    pub fn coverage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.code_coverage.dir = Some(dir.into());
        self
    }

    /// Add a prefix script
    #[must_use]
    pub fn prefix(mut self, source: impl Into<String>) -> Self {
        self.config.app_source.prefix.push(source.into());
        self
    }

    /// Add an application script
    #[must_use]
    pub fn app(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.config.app_source.app.insert(name, source);
        self
    }

    /// Add a suffix script
    #[must_use]
    pub fn suffix(mut self, source: impl Into<String>) -> Self {
        self.config.app_source.suffix.push(source.into());
        self
    }

    /// Set the injection text
    #[must_use]
    pub fn injection(mut self, text: impl Into<String>) -> Self {
        self.config.injection = text.into();
        self
    }

    /// Set the document URL
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    /// Set the message printed after a report format is written
    #[must_use]
    pub fn done_message(mut self, format: impl Into<String>, message: impl Into<String>) -> Self {
        self.config.done_message.insert(format.into(), message.into());
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> RunConfig {
        self.config
    }
}

//! Script assembly: prefix ++ application ++ suffix.
//!
//! Later scripts may read globals defined by earlier ones, so the assembled
//! order is the execution order inside the document.

use crate::config::SourceBundle;
use crate::instrument::{prepare_app_sources, Instrumenter};
use crate::result::HarnessResult;
use std::path::Path;

/// Where a script unit came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOrigin {
    /// Prefix script at this index
    Prefix(usize),
    /// Application script with this logical name
    App(String),
    /// Suffix script at this index
    Suffix(usize),
}

impl std::fmt::Display for ScriptOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prefix(i) => write!(f, "prefix[{i}]"),
            Self::App(name) => write!(f, "app:{name}"),
            Self::Suffix(i) => write!(f, "suffix[{i}]"),
        }
    }
}

/// One script ready to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptUnit {
    /// Origin in the source bundle
    pub origin: ScriptOrigin,
    /// Script text, instrumented for application units when coverage is on
    pub source: String,
}

/// Ordered scripts for the document. Never modified after assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembledScripts {
    units: Vec<ScriptUnit>,
}

impl AssembledScripts {
    /// Assemble from prefix, prepared application bodies and suffix.
    ///
    /// `app` must be in the bundle's map order.
    #[must_use]
    pub fn assemble(bundle: &SourceBundle, app: Vec<String>) -> Self {
        let prefix = bundle
            .prefix
            .iter()
            .enumerate()
            .map(|(i, source)| ScriptUnit {
                origin: ScriptOrigin::Prefix(i),
                source: source.clone(),
            });
        let app = bundle
            .app
            .names()
            .into_iter()
            .zip(app)
            .map(|(name, source)| ScriptUnit {
                origin: ScriptOrigin::App(name.to_string()),
                source,
            });
        let suffix = bundle
            .suffix
            .iter()
            .enumerate()
            .map(|(i, source)| ScriptUnit {
                origin: ScriptOrigin::Suffix(i),
                source: source.clone(),
            });

        Self {
            units: prefix.chain(app).chain(suffix).collect(),
        }
    }

    /// Units in load order
    #[must_use]
    pub fn units(&self) -> &[ScriptUnit] {
        &self.units
    }

    /// Script texts in load order
    #[must_use]
    pub fn sources(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.source.as_str()).collect()
    }

    /// Number of units
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether there are no units
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Prepare application sources (instrumenting when `coverage` is set) and
/// assemble the full script list.
pub fn assemble_sources(
    bundle: &SourceBundle,
    coverage: bool,
    build_dir: &Path,
    instrumenter: &dyn Instrumenter,
) -> HarnessResult<AssembledScripts> {
    let app = prepare_app_sources(&bundle.app, coverage, build_dir, instrumenter)?;
    let scripts = AssembledScripts::assemble(bundle, app);
    tracing::debug!(
        units = scripts.len(),
        instrumented = coverage,
        "assembled document scripts"
    );
    Ok(scripts)
}

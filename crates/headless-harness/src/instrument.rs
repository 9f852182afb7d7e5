//! Coverage instrumentation adapter.
//!
//! The rewriting itself belongs to an external instrumenter; this module only
//! decides when it runs and where each unit is persisted first, so that
//! coverage can be attributed to a stable file path.

use crate::config::AppSources;
use crate::result::{HarnessError, HarnessResult};
use crate::temp_files::{app_unit_path, write_artifact};
use std::fmt::Debug;
use std::path::Path;

/// Rewrites a source unit so that it records execution counters.
///
/// Instrumented code is expected to publish its counters on the
/// `__coverage__` global of the document it runs in.
pub trait Instrumenter: Debug + Send + Sync {
    /// Instrument `source`, attributing coverage to `path`
    fn instrument(&self, source: &str, path: &Path) -> HarnessResult<String>;
}

/// Instrumenter that returns sources unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInstrumenter;

impl Instrumenter for NoopInstrumenter {
    fn instrument(&self, source: &str, _path: &Path) -> HarnessResult<String> {
        Ok(source.to_string())
    }
}

/// Produce the application script bodies in map order.
///
/// Without coverage the sources pass through untouched. With coverage each unit
/// is written to `<build_dir>/<name>.js` before it is instrumented; a failed
/// write aborts before any environment exists.
pub fn prepare_app_sources(
    app: &AppSources,
    coverage: bool,
    build_dir: &Path,
    instrumenter: &dyn Instrumenter,
) -> HarnessResult<Vec<String>> {
    if !coverage {
        return Ok(app.iter().map(|script| script.source.clone()).collect());
    }

    app.iter()
        .map(|script| {
            let path = app_unit_path(build_dir, &script.name);
            write_artifact(&path, script.source.as_bytes())?;
            tracing::debug!(name = %script.name, path = %path.display(), "instrumenting");
            instrumenter
                .instrument(&script.source, &path)
                .map_err(|e| match e {
                    HarnessError::Instrumentation { .. } => e,
                    other => HarnessError::Instrumentation {
                        name: script.name.clone(),
                        message: other.to_string(),
                    },
                })
        })
        .collect()
}

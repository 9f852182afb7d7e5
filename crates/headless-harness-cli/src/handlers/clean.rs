//! Clean command handler

use crate::{CleanArgs, CliResult};
use headless_harness::temp_files::cleanup_for;
use headless_harness::{CleanupOutcome, HostConsole, RunConfig};

/// Execute the clean command; returns how many files were removed.
///
/// Removal is advisory: missing files are skipped, failures are reported but
/// do not fail the command.
pub fn execute_clean(args: &CleanArgs, console: &dyn HostConsole) -> CliResult<usize> {
    let config = RunConfig::from_path(&args.config)?;
    let outcomes = cleanup_for(&config.build_dir, &config.test_files);

    let mut removed = 0;
    for outcome in &outcomes {
        match outcome {
            CleanupOutcome::Removed(path) => {
                removed += 1;
                tracing::debug!(path = %path.display(), "removed");
            }
            CleanupOutcome::AlreadyGone(_) => {}
            CleanupOutcome::Failed { path, message } => {
                console.error(&format!("could not remove {}: {message}", path.display()));
            }
        }
    }
    console.log(&format!(
        "Removed {removed} of {} staged test file(s)",
        outcomes.len()
    ));
    Ok(removed)
}

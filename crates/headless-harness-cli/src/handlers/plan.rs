//! Plan command handler

use crate::{CliResult, PlanArgs};
use headless_harness::temp_files::temp_test_path;
use headless_harness::{AssembledScripts, HostConsole, RunConfig};

/// Execute the plan command
pub fn execute_plan(args: &PlanArgs, console: &dyn HostConsole) -> CliResult<()> {
    let config = RunConfig::from_path(&args.config)?;
    config.validate()?;
    for line in render_plan(&config) {
        console.log(&line);
    }
    Ok(())
}

/// Describe what a run of `config` would load and stage, without touching disk
#[must_use]
pub fn render_plan(config: &RunConfig) -> Vec<String> {
    let app = config
        .app_source
        .app
        .iter()
        .map(|script| script.source.clone())
        .collect();
    let scripts = AssembledScripts::assemble(&config.app_source, app);
    let options = config.mocha_opts.resolved();

    let mut lines = vec![
        format!("URL: {}", config.url),
        format!("Build dir: {}", config.build_dir.display()),
        format!(
            "Runner: {} / {} / {}ms",
            options.interface.as_str(),
            options.reporter.as_str(),
            options.timeout.as_millis()
        ),
        format!("Scripts ({}):", scripts.len()),
    ];
    for (index, unit) in scripts.units().iter().enumerate() {
        lines.push(format!("  {:>3}. {}", index + 1, unit.origin));
    }

    lines.push(format!("Test files ({}):", config.test_files.len()));
    for file in &config.test_files {
        lines.push(format!(
            "  {} -> {}",
            file.display(),
            temp_test_path(&config.build_dir, file).display()
        ));
    }

    if config.code_coverage.active {
        lines.push(format!(
            "Coverage: {} -> {}",
            config.code_coverage.report_type.join(", "),
            config.coverage_dir().display()
        ));
    } else {
        lines.push("Coverage: off".to_string());
    }
    lines
}

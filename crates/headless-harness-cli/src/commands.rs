//! CLI command definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// headless-harness: inspect runs, render coverage reports and clean scratch files
#[derive(Parser, Debug)]
#[command(name = "headless-harness")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the script load order and staged test file names of a run
    Plan(PlanArgs),

    /// Merge coverage dumps and write the configured reports
    Report(ReportArgs),

    /// Remove the staged test files a run would produce
    Clean(CleanArgs),
}

/// Arguments for the plan command
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Run configuration (YAML or JSON)
    pub config: PathBuf,
}

/// Arguments for the report command
#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// Run configuration (YAML or JSON)
    pub config: PathBuf,

    /// Raw `__coverage__` JSON dumps to merge
    #[arg(required = true)]
    pub coverage: Vec<PathBuf>,

    /// Report formats, overriding `codeCoverage.reportType`
    #[arg(short, long, value_delimiter = ',')]
    pub format: Vec<String>,

    /// Output directory, overriding `codeCoverage.dir`
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the clean command
#[derive(Parser, Debug)]
pub struct CleanArgs {
    /// Run configuration (YAML or JSON)
    pub config: PathBuf,
}

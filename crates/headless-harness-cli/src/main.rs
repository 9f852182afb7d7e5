//! headless-harness CLI entry point

use clap::Parser;
use headless_harness::{init_logging, StdoutConsole, Verbosity};
use headless_harness_cli::{
    handlers::{execute_clean, execute_plan, execute_report},
    Cli, CliResult, Commands,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(Verbosity::from_flags(cli.quiet, cli.verbose));
    let console = StdoutConsole;

    match cli.command {
        Commands::Plan(args) => execute_plan(&args, &console),
        Commands::Report(args) => {
            let written = execute_report(&args, &console)?;
            if !cli.quiet {
                for report in &written {
                    for file in &report.files {
                        println!("{}: {}", report.format, file.display());
                    }
                }
            }
            Ok(())
        }
        Commands::Clean(args) => execute_clean(&args, &console).map(|_| ()),
    }
}

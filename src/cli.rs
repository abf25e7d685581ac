//! Command-line interface module for filefix.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Configuration loading and error reporting
//! - Dry-run planning
//! - Running the pipeline and mapping its outcome to an exit code

use crate::config::Config;
use crate::output::{ConsoleSink, OutputFormatter};
use crate::pipeline::{self, CancelFlag, RunOptions, Summary};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// The run completed; per-file failures do not change this.
pub const EXIT_OK: u8 = 0;
/// Configuration could not be loaded, or the run could not start.
pub const EXIT_FAILURE: u8 = 1;
/// The run was interrupted.
pub const EXIT_INTERRUPTED: u8 = 130;

#[derive(Debug, Parser)]
#[command(name = "filefix")]
#[command(version, about = "Organize a downloads directory into folders by extension, then remove duplicates and empty folders")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Also write log records to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

/// Represents a CLI command to execute.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Organize, deduplicate, and clean up the configured download directory
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Path to the JSON (or .toml) configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: PathBuf,

    /// Show which files would be moved without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Number of worker threads (default: number of CPUs)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Print the summary as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Do not draw progress bars
    #[arg(long)]
    pub no_progress: bool,
}

/// Runs a parsed command and returns the process exit code.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use filefix::cli::{Cli, run_cli};
/// use filefix::pipeline::CancelFlag;
///
/// let cli = Cli::parse_from(["filefix", "run", "--config", "filefix.json"]);
/// let code = run_cli(cli.command, CancelFlag::new());
/// std::process::exit(code.into());
/// ```
pub fn run_cli(command: Command, cancel: CancelFlag) -> u8 {
    match command {
        Command::Run(args) if args.dry_run => dry_run(&args),
        Command::Run(args) => run(&args, cancel),
    }
}

fn load_config(args: &RunArgs) -> Option<Config> {
    match Config::load(&args.config) {
        Ok(config) => Some(config),
        Err(e) => {
            OutputFormatter::error(&format!("Error loading configuration: {}", e));
            None
        }
    }
}

fn dry_run(args: &RunArgs) -> u8 {
    let Some(config) = load_config(args) else {
        return EXIT_FAILURE;
    };

    OutputFormatter::info(&format!(
        "DRY RUN: Analyzing contents of: {}",
        config.download_dir.display()
    ));

    match pipeline::plan_organize(&config.folders, &config.download_dir) {
        Ok(moves) => {
            OutputFormatter::plan(&moves);
            OutputFormatter::success("Dry run complete. No files were modified.");
            EXIT_OK
        }
        Err(e) => {
            OutputFormatter::error(&format!(
                "Error reading directory {}: {}",
                config.download_dir.display(),
                e
            ));
            EXIT_FAILURE
        }
    }
}

fn run(args: &RunArgs, cancel: CancelFlag) -> u8 {
    let Some(config) = load_config(args) else {
        return EXIT_FAILURE;
    };

    if !args.json {
        OutputFormatter::info(&format!(
            "Organizing contents of: {}",
            config.download_dir.display()
        ));
    }

    let sink = ConsoleSink::new(!args.no_progress && !args.json);
    let options = RunOptions {
        workers: args.workers,
        cancel,
    };

    match pipeline::run(&config, &options, &sink) {
        Ok(summary) => {
            report(&summary, args.json);
            exit_code(&summary)
        }
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            EXIT_FAILURE
        }
    }
}

fn report(summary: &Summary, json: bool) {
    if !json {
        OutputFormatter::summary_table(summary);
        return;
    }
    match serde_json::to_string_pretty(summary) {
        Ok(text) => println!("{}", text),
        Err(e) => OutputFormatter::error(&format!("Could not serialize summary: {}", e)),
    }
}

/// Exit code for a finished run.
pub fn exit_code(summary: &Summary) -> u8 {
    if summary.interrupted {
        EXIT_INTERRUPTED
    } else {
        EXIT_OK
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mover::FolderCounts;

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::try_parse_from([
            "filefix", "run", "--config", "cfg.json", "--workers", "4", "--json", "-vv",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Command::Run(args) = cli.command;
        assert_eq!(args.config, PathBuf::from("cfg.json"));
        assert_eq!(args.workers, Some(4));
        assert!(args.json);
        assert!(!args.dry_run);
    }

    #[test]
    fn test_config_is_required() {
        assert!(Cli::try_parse_from(["filefix", "run"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["filefix", "run", "-c", "x.json", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_exit_code() {
        let mut summary = Summary {
            started_at: String::new(),
            folder_counts: FolderCounts::default(),
            duplicates_removed: 0,
            empty_folders_removed: 0,
            failures: 3,
            interrupted: false,
            elapsed_secs: 0.0,
        };
        assert_eq!(exit_code(&summary), EXIT_OK);

        summary.interrupted = true;
        assert_eq!(exit_code(&summary), EXIT_INTERRUPTED);
    }
}

use clap::Parser;
use filefix::cli::{Cli, EXIT_FAILURE, run_cli};
use filefix::logging;
use filefix::output::OutputFormatter;
use filefix::pipeline::CancelFlag;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Keeps the file writer flushing until main returns.
    let _log_guard = match logging::init_logger(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            OutputFormatter::error(&e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        OutputFormatter::warning("Shutdown requested. Finishing current files...");
        handler_flag.cancel();
    }) {
        OutputFormatter::warning(&format!("Could not install Ctrl-C handler: {}", e));
    }

    ExitCode::from(run_cli(cli.command, cancel))
}

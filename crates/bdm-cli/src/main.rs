use bdm_core::logging;

mod cli;

use crate::cli::CliCommand;

/// Exit status for errors raised before any download starts.
const EXIT_USAGE: i32 = 2;

#[tokio::main]
async fn main() {
    // Fall back to stderr when the state directory is not usable.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    match CliCommand::run_from_args().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("bdm error: {:#}", err);
            std::process::exit(EXIT_USAGE);
        }
    }
}

use clap::Parser;
use mfetch_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Log to the state dir; stderr if that is not writable.
    let verbosity = cli.verbosity();
    if let Err(e) = logging::init_logging(verbosity) {
        logging::init_logging_stderr(verbosity);
        tracing::warn!("file logging unavailable, using stderr: {:#}", e);
    }

    if let Err(err) = cli.run().await {
        eprintln!("mfetch error: {:#}", err);
        std::process::exit(1);
    }
}

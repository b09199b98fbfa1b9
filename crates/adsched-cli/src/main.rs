use adsched_core::{config, logging};
use clap::Parser;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match config::load_or_init() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("adsched error: {:#}", err);
            std::process::exit(1);
        }
    };

    // File logging per config; fall back to stderr.
    if let Err(err) = logging::init_logging(&cfg) {
        logging::init_logging_stderr(&cfg);
        tracing::warn!("file logging unavailable: {:#}", err);
    }
    tracing::debug!("loaded config: {:?}", cfg);

    if let Err(err) = cli.run(&cfg).await {
        eprintln!("adsched error: {:#}", err);
        std::process::exit(1);
    }
}

//! rdnsx: a subdomain bruteforce tool that wraps around massdns.

use clap::Parser;
use rdnsx_core::Console;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let quiet = cli.quiet;
    let debug = cli.debug;

    let result = match cli.command {
        Commands::Resolve(args) => commands::resolve::run(args, quiet, debug).await,
        Commands::Bruteforce(args) => commands::bruteforce::run(args, quiet, debug).await,
        Commands::Sponsors => commands::sponsors::run(),
    };

    if let Err(err) = result {
        Console::new(quiet).fatal(err.to_string());
        std::process::exit(1);
    }
}

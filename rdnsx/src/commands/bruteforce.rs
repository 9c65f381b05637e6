//! `rdnsx bruteforce` (§6).

use anyhow::Result;
use rdnsx_core::{Mode, Orchestrator};

use crate::cli::BruteforceArgs;
use crate::commands::build_options;

pub async fn run(args: BruteforceArgs, quiet: bool, debug: bool) -> Result<()> {
    let mut options = build_options(Mode::Bruteforce, &args.shared, quiet, debug);
    options.wordlist = args.wordlist;
    options.domain = args.domain;
    options.domain_list_file = args.domains_file;

    Orchestrator::new(options).run().await?;
    Ok(())
}

//! `rdnsx resolve` (§6).

use anyhow::Result;
use rdnsx_core::{Mode, Orchestrator};

use crate::cli::ResolveArgs;
use crate::commands::build_options;

pub async fn run(args: ResolveArgs, quiet: bool, debug: bool) -> Result<()> {
    let mut options = build_options(Mode::Resolve, &args.shared, quiet, debug);
    options.domain_file = args.file;

    Orchestrator::new(options).run().await?;
    Ok(())
}

pub mod bruteforce;
pub mod resolve;
pub mod sponsors;

use std::io::IsTerminal;

use rdnsx_core::{Mode, ResolveOptions};

use crate::cli::SharedOptions;

/// Maps the flags shared by `resolve` and `bruteforce` onto the library's
/// option type, filling in its defaults for anything left unset on the CLI.
pub(crate) fn build_options(mode: Mode, shared: &SharedOptions, quiet: bool, debug: bool) -> ResolveOptions {
    let mut opts = ResolveOptions::new(mode);

    opts.bin_path = shared.bin.clone();
    if let Some(resolvers) = &shared.resolvers {
        opts.resolver_file = resolvers.clone();
    }
    if let Some(trusted) = &shared.resolvers_trusted {
        opts.resolver_trusted_file = Some(trusted.clone());
    }
    opts.trusted_only = shared.trusted_only;
    opts.rate_limit = shared.rate_limit;
    opts.rate_limit_trusted = shared.rate_limit_trusted;
    opts.wildcard_threads = shared.threads;
    opts.wildcard_tests = shared.wildcard_tests;
    opts.wildcard_batch_size = shared.wildcard_batch;
    opts.skip_sanitize = shared.skip_sanitize;
    opts.skip_wildcard_filter = shared.skip_wildcard_filter;
    opts.skip_validation = shared.skip_validation;
    opts.write_domains_file = shared.write.clone();
    opts.write_massdns_file = shared.write_massdns.clone();
    opts.write_wildcards_file = shared.write_wildcards.clone();
    opts.quiet = quiet;
    opts.debug = debug;
    opts.stdin_is_pipe = !std::io::stdin().is_terminal();

    opts
}

//! Option types and defaults for the resolve/bruteforce pipeline (§6).
//!
//! Grounded on `internal/app/ctx/options.go`: `DefaultGlobalOptions`,
//! `DefaultResolveOptions`, and `ResolveOptions.Validate` (the `--trusted-only`
//! implies `--skip-validation` reconciliation, and the bruteforce-mode
//! domain/wordlist precondition).

use std::path::PathBuf;

use crate::error::{PipelineError, Result};

/// The built-in trusted resolvers used when no `--resolvers-trusted` file is
/// given or found (`ctx.DefaultGlobalOptions`).
pub const DEFAULT_TRUSTED_RESOLVERS: [&str; 2] = ["8.8.8.8", "8.8.4.4"];

/// Which of the two CLI subcommands produced this run (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Resolve,
    Bruteforce,
}

/// All options governing one orchestrator run, covering both the `resolve` and
/// `bruteforce` subcommands (§6's flag table).
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub mode: Mode,

    pub bin_path: PathBuf,

    pub resolver_file: PathBuf,
    pub resolver_trusted_file: Option<PathBuf>,
    pub trusted_only: bool,

    pub rate_limit: u32,
    pub rate_limit_trusted: u32,

    pub wildcard_threads: usize,
    pub wildcard_tests: usize,
    pub wildcard_batch_size: usize,

    pub skip_sanitize: bool,
    pub skip_wildcard_filter: bool,
    pub skip_validation: bool,

    pub write_domains_file: Option<PathBuf>,
    pub write_massdns_file: Option<PathBuf>,
    pub write_wildcards_file: Option<PathBuf>,

    pub quiet: bool,
    pub debug: bool,

    /// Resolve mode: the file of fully qualified domains, or `None` for stdin.
    pub domain_file: Option<PathBuf>,
    /// Bruteforce mode: the wordlist file, or `None` for stdin.
    pub wordlist: Option<PathBuf>,
    /// Bruteforce mode: a single parent domain (the `<domain>` positional).
    pub domain: Option<String>,
    /// Bruteforce mode: a file containing one parent domain per line, as an
    /// alternative to `domain` (`-d domains-file`, §6).
    pub domain_list_file: Option<PathBuf>,

    /// Whether standard input is a pipe, supplied by the CLI layer so the
    /// library never probes the process's own file descriptors (§6).
    pub stdin_is_pipe: bool,
}

impl ResolveOptions {
    /// Mirrors `DefaultResolveOptions`: unlimited public rate, 500qps trusted,
    /// 100 wildcard threads, 3 wildcard tests, unlimited batch size.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            bin_path: PathBuf::from("massdns"),
            resolver_file: default_resolver_path(),
            resolver_trusted_file: default_trusted_resolver_path(),
            trusted_only: false,
            rate_limit: 0,
            rate_limit_trusted: 500,
            wildcard_threads: 100,
            wildcard_tests: 3,
            wildcard_batch_size: 0,
            skip_sanitize: false,
            skip_wildcard_filter: false,
            skip_validation: false,
            write_domains_file: None,
            write_massdns_file: None,
            write_wildcards_file: None,
            quiet: false,
            debug: false,
            domain_file: None,
            wordlist: None,
            domain: None,
            domain_list_file: None,
            stdin_is_pipe: false,
        }
    }

    /// Reconciles option combinations and rejects invalid invocations before
    /// phase 1 runs (§4.1, `ResolveOptions.Validate`).
    pub fn validate(&mut self) -> Result<()> {
        if self.trusted_only {
            self.skip_validation = true;
        }

        if self.mode == Mode::Bruteforce {
            if self.domain.is_none() && self.domain_list_file.is_none() {
                return Err(PipelineError::invalid_options(
                    "bruteforce mode requires a parent domain or a domain file",
                ));
            }
            if self.wordlist.is_none() && !self.stdin_is_pipe {
                return Err(PipelineError::invalid_options(
                    "bruteforce mode requires a wordlist or piped standard input",
                ));
            }
        } else if self.domain_file.is_none() && !self.stdin_is_pipe {
            return Err(PipelineError::invalid_options(
                "resolve mode requires a domain file or piped standard input",
            ));
        }

        Ok(())
    }
}

/// `"resolvers.txt"` if present in the working directory, else
/// `~/.config/<prog>/resolvers.txt`.
fn default_resolver_path() -> PathBuf {
    let local = PathBuf::from("resolvers.txt");
    if local.exists() {
        return local;
    }
    config_dir_path("resolvers.txt")
}

/// `~/.config/<prog>/resolvers-trusted.txt`, only if it exists (`ctx.go` leaves
/// the trusted file empty otherwise, falling back to the built-in defaults).
fn default_trusted_resolver_path() -> Option<PathBuf> {
    let path = config_dir_path("resolvers-trusted.txt");
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

fn config_dir_path(file: &str) -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .map(|home| home.join(".config").join("rdnsx").join(file))
        .unwrap_or_else(|| PathBuf::from(file))
}

/// Per-resolver QPS derived from a global rate (§4.5.7, `qpsPerResolver`):
/// `0` with no resolvers, else `max(1, global / count)`.
pub fn qps_per_resolver(resolver_count: usize, global_qps: u32) -> u32 {
    if resolver_count == 0 {
        return 0;
    }
    (global_qps / resolver_count as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trusted_only_implies_skip_validation() {
        let mut opts = ResolveOptions::new(Mode::Resolve);
        opts.trusted_only = true;
        opts.domain_file = Some(PathBuf::from("domains.txt"));
        opts.validate().unwrap();
        assert!(opts.skip_validation);
    }

    #[test]
    fn bruteforce_requires_domain_and_wordlist() {
        let mut opts = ResolveOptions::new(Mode::Bruteforce);
        assert!(opts.validate().is_err());

        opts.domain = Some("example.com".to_string());
        assert!(opts.validate().is_err());

        opts.wordlist = Some(PathBuf::from("words.txt"));
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn bruteforce_accepts_stdin_in_place_of_wordlist() {
        let mut opts = ResolveOptions::new(Mode::Bruteforce);
        opts.domain = Some("example.com".to_string());
        opts.stdin_is_pipe = true;
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn qps_per_resolver_matches_spec_boundary_cases() {
        assert_eq!(qps_per_resolver(0, 500), 0);
        assert_eq!(qps_per_resolver(10, 500), 50);
        assert_eq!(qps_per_resolver(1000, 500), 1);
    }
}

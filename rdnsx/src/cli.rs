//! Top-level CLI surface: `resolve`, `bruteforce`, `sponsors` (§6).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rdnsx")]
#[command(about = "A subdomain bruteforce tool that wraps around massdns", long_about = None)]
#[command(
    version,
    after_help = "  rdnsx resolve domains.txt\n  rdnsx bruteforce wordlist.txt domain.com --resolvers public.txt\n  cat domains.txt | rdnsx resolve"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Keep intermediate files
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a list of domains
    Resolve(ResolveArgs),
    /// Bruteforce subdomains using a wordlist
    Bruteforce(BruteforceArgs),
    /// Show the active sponsors
    Sponsors,
}

/// Flags shared by `resolve` and `bruteforce` (§6's flag table).
#[derive(Args, Clone)]
pub struct SharedOptions {
    /// Path to massdns binary file
    #[arg(short = 'b', long = "bin", default_value = "massdns")]
    pub bin: PathBuf,

    /// Limit total queries per second for public resolvers (0 = unlimited)
    #[arg(short = 'l', long = "rate-limit", default_value_t = 0)]
    pub rate_limit: u32,

    /// Limit total queries per second for trusted resolvers (0 = unlimited)
    #[arg(long = "rate-limit-trusted", default_value_t = 500)]
    pub rate_limit_trusted: u32,

    /// Text file containing public resolvers
    #[arg(short = 'r', long = "resolvers")]
    pub resolvers: Option<PathBuf>,

    /// Text file containing trusted resolvers
    #[arg(long = "resolvers-trusted")]
    pub resolvers_trusted: Option<PathBuf>,

    /// Use only trusted resolvers (implies --skip-validation)
    #[arg(long = "trusted-only")]
    pub trusted_only: bool,

    /// Number of threads to use while filtering wildcards
    #[arg(short = 't', long = "threads", default_value_t = 100)]
    pub threads: usize,

    /// Number of tests to perform to detect DNS load balancing
    #[arg(short = 'n', long = "wildcard-tests", default_value_t = 3)]
    pub wildcard_tests: usize,

    /// Number of subdomains to test for wildcards in a single batch (0 = unlimited)
    #[arg(long = "wildcard-batch", default_value_t = 0)]
    pub wildcard_batch: usize,

    /// Write found domains to a file
    #[arg(short = 'w', long = "write")]
    pub write: Option<PathBuf>,

    /// Write massdns database to a file (-o Snl format)
    #[arg(long = "write-massdns")]
    pub write_massdns: Option<PathBuf>,

    /// Write wildcard subdomain roots to a file
    #[arg(long = "write-wildcards")]
    pub write_wildcards: Option<PathBuf>,

    /// Do not sanitize the list of domains to test
    #[arg(long = "skip-sanitize")]
    pub skip_sanitize: bool,

    /// Do not perform wildcard detection and filtering
    #[arg(long = "skip-wildcard-filter")]
    pub skip_wildcard_filter: bool,

    /// Do not validate results with trusted resolvers
    #[arg(long = "skip-validation")]
    pub skip_validation: bool,
}

/// `rdnsx resolve <file> [flags]`. `<file>` is omitted when domains are read
/// from standard input.
#[derive(Args)]
pub struct ResolveArgs {
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub shared: SharedOptions,
}

/// `rdnsx bruteforce <wordlist> <domain> [flags]`, or `<wordlist> -d
/// <domains-file>` in place of a single domain.
#[derive(Args)]
pub struct BruteforceArgs {
    pub wordlist: Option<PathBuf>,
    pub domain: Option<String>,

    /// Text file containing domains to bruteforce
    #[arg(short = 'd', long = "domains")]
    pub domains_file: Option<PathBuf>,

    #[command(flatten)]
    pub shared: SharedOptions,
}

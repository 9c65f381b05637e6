//! Orchestrator: drives the resolution pipeline's stages in strict order (§4.1).
//!
//! Grounded on `internal/usecase/resolve/resolve.go` (`Initialize`'s
//! precondition/workfile/resolver-prep phases, then `Resolve`'s
//! `createDomainReader` -> `resolvePublic` -> `filterWildcards` ->
//! `resolveTrusted` -> `writeResults` sequence) and `wildcardfilter.go` (the
//! per-batch precache/wildcard loop, `qpsPerResolver`, `prepareCache`).

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::DnsCache;
use crate::cache_reader::CacheReader;
use crate::config::{qps_per_resolver, Mode, ResolveOptions, DEFAULT_TRUSTED_RESOLVERS};
use crate::console::Console;
use crate::domain_source::DomainSource;
use crate::error::{PipelineError, Result, Stage};
use crate::massdns::{check_binary, MassResolver};
use crate::resolver_client::HickoryResolverClient;
use crate::wildcard::Wildcarder;
use crate::workspace::Workspace;

/// Fixed retry count and concurrency the donor's `createWildcarder` passes to
/// `NewClientDNS` regardless of CLI options.
const WILDCARD_RESOLVER_RETRIES: u32 = 10;
const WILDCARD_RESOLVER_CONCURRENCY: usize = 100;

/// The outcome of a full orchestrator run (§4.1 phase 8, emit).
pub struct RunResult {
    pub domains: Vec<String>,
    pub wildcard_roots: Vec<String>,
    /// `Some` only when `--debug` retained the workspace past this run.
    pub workspace_path: Option<PathBuf>,
}

/// Drives the pipeline end-to-end for one invocation. Construct a fresh
/// `Orchestrator` per run.
pub struct Orchestrator {
    options: ResolveOptions,
    console: Console,
}

impl Orchestrator {
    pub fn new(options: ResolveOptions) -> Self {
        let console = Console::new(options.quiet);
        Self { options, console }
    }

    pub async fn run(mut self) -> Result<RunResult> {
        self.options.validate()?;

        // Phase 1: precondition check.
        check_binary(&self.options.bin_path)?;

        // Phase 2: workspace.
        let workspace = Workspace::create()?;

        // Phase 3: resolvers.
        let trusted_resolvers = self.prepare_resolvers(&workspace)?;

        // Phase 4: source stream + candidate count.
        let (source, total_hint) = self.build_source()?;

        // Phase 5: public mass-resolve (or the trusted-only pass in its place).
        let (resolve_resolvers, resolve_qps) = if self.options.trusted_only {
            (workspace.trusted_resolvers.clone(), self.options.rate_limit_trusted)
        } else {
            (workspace.public_resolvers.clone(), self.options.rate_limit)
        };
        self.console.info(format!(
            "resolving domains with {} resolvers",
            if self.options.trusted_only { "trusted" } else { "public" }
        ));
        self.mass_resolve(
            Box::new(BufReader::new(source)),
            &resolve_resolvers,
            &workspace.massdns_public,
            resolve_qps,
            Stage::MassResolvePublic,
        )
        .await?;

        // Phase 6: wildcard filter.
        self.console.info("detecting wildcard root subdomains");
        let (mut domain_count, mut roots) = self
            .filter_wildcards(&workspace, &trusted_resolvers, total_hint)
            .await?;

        if !roots.is_empty() {
            self.console
                .success(format!("found {} wildcard roots", roots.len()));
        }
        write_lines(&roots, &workspace.wildcard_roots)
            .map_err(|e| PipelineError::stage(Stage::WildcardFilter, e))?;

        // Phase 7: trusted re-validate.
        if !self.options.skip_validation && !self.options.trusted_only {
            self.console.info("validating domains against trusted resolvers");
            domain_count = self.revalidate(&workspace).await?;
        }

        // Phase 8: emit.
        let domains = read_lines(&workspace.domains).map_err(|e| PipelineError::stage(Stage::Emit, e))?;
        for domain in &domains {
            println!("{domain}");
        }

        if domain_count > 0 {
            self.console.success(format!("found {domain_count} valid domains"));
        } else {
            self.console.info("no valid domains remaining");
        }

        self.write_outputs(&workspace)?;

        let workspace_path = if self.options.debug {
            let path = workspace.keep();
            self.console.info(format!("debug files kept in: {}", path.display()));
            Some(path)
        } else {
            None
        };

        Ok(RunResult {
            domains,
            wildcard_roots: std::mem::take(&mut roots),
            workspace_path,
        })
    }

    /// Phase 3: copy public resolvers into the workspace, load/derive the
    /// trusted list, and write it into the workspace too (`prepareResolvers`).
    fn prepare_resolvers(&self, workspace: &Workspace) -> Result<Vec<String>> {
        if !self.options.trusted_only {
            fs::copy(&self.options.resolver_file, &workspace.public_resolvers)
                .map_err(|e| PipelineError::stage(Stage::Resolvers, e))?;
        }

        let loaded = match &self.options.resolver_trusted_file {
            Some(path) => read_lines(path).map_err(|e| PipelineError::stage(Stage::Resolvers, e))?,
            None => Vec::new(),
        };
        let trusted = if loaded.is_empty() {
            DEFAULT_TRUSTED_RESOLVERS.iter().map(|s| s.to_string()).collect()
        } else {
            loaded
        };

        write_lines(&trusted, &workspace.trusted_resolvers)
            .map_err(|e| PipelineError::stage(Stage::Resolvers, e))?;

        Ok(trusted)
    }

    /// Phase 4: build the candidate stream and the progress total hint
    /// (`createDomainReader*`): `lines(input) * max(1, |parents|)` for a file
    /// source, `0` (unknown) for standard input (§4.1 step 4).
    fn build_source(&self) -> Result<(DomainSource, usize)> {
        let parents = self.parent_domains()?;

        let (reader, lines_hint): (Box<dyn BufRead + Send>, Option<usize>) = match self.options.mode {
            Mode::Resolve => match &self.options.domain_file {
                Some(path) => {
                    let count = count_lines(path).map_err(|e| PipelineError::stage(Stage::Source, e))?;
                    let file = File::open(path).map_err(|e| PipelineError::stage(Stage::Source, e))?;
                    (Box::new(BufReader::new(file)), Some(count))
                }
                None => (Box::new(BufReader::new(io::stdin())), None),
            },
            Mode::Bruteforce => match &self.options.wordlist {
                Some(path) => {
                    let count = count_lines(path).map_err(|e| PipelineError::stage(Stage::Source, e))?;
                    let file = File::open(path).map_err(|e| PipelineError::stage(Stage::Source, e))?;
                    (Box::new(BufReader::new(file)), Some(count))
                }
                None => (Box::new(BufReader::new(io::stdin())), None),
            },
        };

        let total_hint = lines_hint.map(|n| n * parents.len().max(1)).unwrap_or(0);

        Ok((
            DomainSource::new(reader, parents, !self.options.skip_sanitize),
            total_hint,
        ))
    }

    fn parent_domains(&self) -> Result<Vec<String>> {
        if self.options.mode != Mode::Bruteforce {
            return Ok(Vec::new());
        }
        match &self.options.domain_list_file {
            Some(path) => read_lines(path).map_err(|e| PipelineError::stage(Stage::Source, e)),
            None => Ok(self.options.domain.iter().cloned().collect()),
        }
    }

    /// Phase 5/7's shared mass-resolve call. The external resolver driver is
    /// synchronous (§4.3's doc comment), so it runs on a blocking thread to
    /// avoid stalling the async runtime.
    async fn mass_resolve(
        &self,
        reader: Box<dyn BufRead + Send>,
        resolvers_path: &Path,
        out_path: &Path,
        qps: u32,
        stage: Stage,
    ) -> Result<()> {
        let bin_path = self.options.bin_path.clone();
        let resolvers_path = resolvers_path.to_path_buf();
        let out_path = out_path.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let resolver = MassResolver::new(bin_path);
            resolver
                .resolve(reader, &resolvers_path, &out_path, qps, stage)
                .map(|_governor| ())
        })
        .await
        .map_err(|e| PipelineError::stage(stage, io::Error::other(e)))?
    }

    /// Phase 6 (§4.5.5): run the batch protocol over `workspace.massdns_public`,
    /// or, when `--skip-wildcard-filter` is set, just parse the surviving names
    /// through without running the engine at all.
    async fn filter_wildcards(
        &self,
        workspace: &Workspace,
        trusted_resolvers: &[String],
        _total_hint: usize,
    ) -> Result<(usize, Vec<String>)> {
        if self.options.skip_wildcard_filter {
            let count = parse_cache_to_file(&workspace.massdns_public, &workspace.domains)
                .map_err(|e| PipelineError::stage(Stage::WildcardFilter, e))?;
            return Ok((count, Vec::new()));
        }

        let qps = qps_per_resolver(trusted_resolvers.len(), self.options.rate_limit_trusted);
        let resolver = Arc::new(
            HickoryResolverClient::new(
                trusted_resolvers,
                WILDCARD_RESOLVER_RETRIES,
                qps,
                WILDCARD_RESOLVER_CONCURRENCY,
            )
            .map_err(|e| PipelineError::stage(Stage::WildcardFilter, io::Error::other(e.to_string())))?,
        );
        let wildcarder = Wildcarder::new(
            resolver,
            self.options.wildcard_threads,
            self.options.wildcard_tests,
            None,
        );

        let cache_file = File::open(&workspace.massdns_public)
            .map_err(|e| PipelineError::stage(Stage::WildcardFilter, e))?;
        let mut cache_reader = CacheReader::new(BufReader::new(cache_file));

        let domains_out = File::create(&workspace.domains)
            .map_err(|e| PipelineError::stage(Stage::WildcardFilter, e))?;
        let mut domains_writer = BufWriter::new(domains_out);

        let mut found = 0usize;
        let mut roots = Vec::new();

        loop {
            let mut scratch = Vec::new();
            let precache = DnsCache::new();
            let count = cache_reader
                .read(
                    Some(&mut scratch),
                    Some(&precache),
                    self.options.wildcard_batch_size,
                )
                .map_err(|e| PipelineError::stage(Stage::WildcardFilter, e))?;
            if count == 0 {
                break;
            }

            let names: Vec<String> = String::from_utf8_lossy(&scratch)
                .lines()
                .map(|s| s.to_string())
                .collect();

            wildcarder.set_pre_cache(Arc::new(precache));
            let result = wildcarder.filter(names).await;

            found += result.domains.len();
            for domain in &result.domains {
                writeln!(domains_writer, "{domain}").map_err(|e| PipelineError::stage(Stage::WildcardFilter, e))?;
            }
            roots = result.roots;
        }

        domains_writer
            .flush()
            .map_err(|e| PipelineError::stage(Stage::WildcardFilter, e))?;

        Ok((found, roots))
    }

    /// Phase 7: re-resolve the surviving domains against trusted resolvers and
    /// overwrite `workspace.domains` with whatever still resolves cleanly.
    async fn revalidate(&self, workspace: &Workspace) -> Result<usize> {
        let file = File::open(&workspace.domains).map_err(|e| PipelineError::stage(Stage::MassResolveTrusted, e))?;
        self.mass_resolve(
            Box::new(BufReader::new(file)),
            &workspace.trusted_resolvers,
            &workspace.massdns_trusted,
            self.options.rate_limit_trusted,
            Stage::MassResolveTrusted,
        )
        .await?;

        parse_cache_to_file(&workspace.massdns_trusted, &workspace.domains)
            .map_err(|e| PipelineError::stage(Stage::MassResolveTrusted, e))
    }

    /// Phase 8's file-copy half (`ResultSaver.Save`): copy the configured
    /// output files if the caller asked for them.
    fn write_outputs(&self, workspace: &Workspace) -> Result<()> {
        if let Some(path) = &self.options.write_domains_file {
            fs::copy(&workspace.domains, path).map_err(|e| PipelineError::stage(Stage::Emit, e))?;
        }
        if let Some(path) = &self.options.write_massdns_file {
            fs::copy(&workspace.massdns_public, path).map_err(|e| PipelineError::stage(Stage::Emit, e))?;
        }
        if let Some(path) = &self.options.write_wildcards_file {
            fs::copy(&workspace.wildcard_roots, path).map_err(|e| PipelineError::stage(Stage::Emit, e))?;
        }
        Ok(())
    }
}

/// Parses an answer log straight through to a domain file without touching
/// any cache (used by `--skip-wildcard-filter` and the trusted re-validate
/// pass, both of which only need the surviving-name projection).
fn parse_cache_to_file(log_path: &Path, domains_path: &Path) -> io::Result<usize> {
    let cache_file = File::open(log_path)?;
    let mut reader = CacheReader::new(BufReader::new(cache_file));
    let mut out = BufWriter::new(File::create(domains_path)?);
    let count = reader.read(Some(&mut out), None, 0)?;
    out.flush()?;
    Ok(count)
}

fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    let file = File::open(path)?;
    BufReader::new(file)
        .lines()
        .map(|l| l.map(|s| s.trim().to_string()))
        .filter(|l| l.as_ref().map(|s| !s.is_empty()).unwrap_or(true))
        .collect()
}

fn write_lines(lines: &[String], path: &Path) -> io::Result<()> {
    let mut writer = BufWriter::new(OpenOptions::new().create(true).write(true).truncate(true).open(path)?);
    for line in lines {
        writeln!(writer, "{line}")?;
    }
    writer.flush()
}

fn count_lines(path: &Path) -> io::Result<usize> {
    let file = File::open(path)?;
    Ok(BufReader::new(file).lines().count())
}

//! The wildcard-detection engine (§4.5): the `Wildcarder` that runs a batch of
//! candidate names through the worker pool and the per-candidate algorithm.
//!
//! Grounded on `pkg/wildcarder/wildcarder.go`: a single long-lived object per
//! orchestrator run, re-used across batches (`SetPreCache` between calls),
//! whose `answerCache`/`dnsCache` grow monotonically for the lifetime of the
//! run while the pre-cache is swapped out per batch.

pub mod detection;
pub mod worker_pool;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::{AnswerCache, DnsCache};
use crate::resolver_client::ResolverClient;
use detection::{new_random_probes, run, DetectionCtx};
use worker_pool::WorkerPool;

/// The result of one [`Wildcarder::filter`] call: the candidates that survived
/// (not wildcards) and every wildcard root known so far (cumulative across all
/// batches run on this instance, per `gatherRoots`).
pub struct FilterResult {
    pub domains: Vec<String>,
    pub roots: Vec<String>,
}

/// Concurrent, cache-amortized wildcard classifier (§4.5). One instance is
/// created per orchestrator run and its `filter` method is called once per
/// batch (§4.5.5); its caches persist across those calls.
pub struct Wildcarder {
    resolver: Arc<dyn ResolverClient>,
    thread_count: usize,
    query_count: usize,
    wildcard_cache: Arc<AnswerCache>,
    pre_cache: Mutex<Arc<DnsCache>>,
    dns_cache: Arc<DnsCache>,
    probes: Arc<Vec<String>>,
    running: AtomicBool,
    total: AtomicU64,
    current_batch: Mutex<Option<Arc<AtomicU64>>>,
}

impl Wildcarder {
    /// `test_count` is `k` from §4.5.2; `probe_seed` fixes the probe draw for
    /// deterministic tests (§9 open question 1), `None` draws from the OS RNG.
    pub fn new(
        resolver: Arc<dyn ResolverClient>,
        thread_count: usize,
        test_count: usize,
        probe_seed: Option<u64>,
    ) -> Self {
        Self {
            resolver,
            thread_count,
            query_count: test_count,
            wildcard_cache: Arc::new(AnswerCache::new()),
            pre_cache: Mutex::new(Arc::new(DnsCache::new())),
            dns_cache: Arc::new(DnsCache::new()),
            probes: Arc::new(new_random_probes(test_count, probe_seed)),
            running: AtomicBool::new(false),
            total: AtomicU64::new(0),
            current_batch: Mutex::new(None),
        }
    }

    /// Swaps in a new pre-cache ahead of the next `filter` call (§4.5.5 step 2).
    pub fn set_pre_cache(&self, cache: Arc<DnsCache>) {
        *self.pre_cache.lock() = cache;
    }

    /// Total DNS wire queries issued by the trusted resolver client so far.
    pub fn query_count(&self) -> u64 {
        self.resolver.query_count()
    }

    /// Domains processed so far, including any batch currently in flight.
    /// Safe to poll concurrently with `filter` for progress reporting.
    pub fn current(&self) -> u64 {
        let batch = self.current_batch.lock();
        let in_flight = batch.as_ref().map(|c| c.load(Ordering::SeqCst)).unwrap_or(0);
        self.total.load(Ordering::SeqCst) + in_flight
    }

    /// Runs one batch through the worker pool. `names` is a blank-trimmed,
    /// blank-line-skipping iterator (`bufio.Scanner`-equivalent) over the
    /// surviving names for this batch.
    ///
    /// # Panics
    ///
    /// Panics if called while a previous call on the same instance is still
    /// running (§5: "the second entry is a programmer error and panics").
    pub async fn filter(&self, names: impl IntoIterator<Item = String>) -> FilterResult {
        if self.running.swap(true, Ordering::SeqCst) {
            panic!("Wildcarder::filter must not be invoked concurrently on the same instance");
        }

        let pool = WorkerPool::new(self.thread_count, 1000);
        let completed_counter = pool.completed_counter();
        *self.current_batch.lock() = Some(completed_counter.clone());

        let ctx = Arc::new(DetectionCtx {
            resolver: self.resolver.clone(),
            wildcard_cache: self.wildcard_cache.clone(),
            pre_cache: self.pre_cache.lock().clone(),
            dns_cache: self.dns_cache.clone(),
            probes: self.probes.clone(),
            query_count: self.query_count,
            results: Mutex::new(Vec::new()),
        });

        for name in names {
            let name = name.trim().to_string();
            if name.is_empty() {
                continue;
            }
            let ctx = ctx.clone();
            pool.execute(Box::pin(async move {
                run(ctx, name).await;
            }))
            .await;
        }

        pool.wait().await;
        let domains = std::mem::take(&mut *ctx.results.lock());
        pool.close().await;

        self.total.fetch_add(completed_counter.load(Ordering::SeqCst), Ordering::SeqCst);
        *self.current_batch.lock() = None;
        self.running.store(false, Ordering::SeqCst);

        FilterResult {
            domains,
            roots: self.wildcard_cache.all_roots(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::{DnsAnswer, RecordType};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicU64;

    /// A deterministic stand-in for the trusted resolver used in the spec's
    /// §8 end-to-end scenarios: exact-name answers take priority, then the
    /// longest matching wildcard-root suffix.
    struct MockResolver {
        exact: HashMap<String, Vec<DnsAnswer>>,
        wildcard_roots: Vec<(String, Vec<DnsAnswer>)>,
        queries: AtomicU64,
    }

    impl MockResolver {
        fn new() -> Self {
            Self {
                exact: HashMap::new(),
                wildcard_roots: Vec::new(),
                queries: AtomicU64::new(0),
            }
        }

        fn with_exact(mut self, name: &str, ip: &str) -> Self {
            self.exact
                .insert(name.to_string(), vec![DnsAnswer::new(RecordType::A, ip)]);
            self
        }

        fn with_wildcard(mut self, root: &str, ip: &str) -> Self {
            self.wildcard_roots
                .push((root.to_string(), vec![DnsAnswer::new(RecordType::A, ip)]));
            self
        }
    }

    #[async_trait]
    impl ResolverClient for MockResolver {
        async fn resolve(&self, names: &[String]) -> Vec<DnsAnswer> {
            self.queries.fetch_add(names.len() as u64, Ordering::SeqCst);
            let mut out = Vec::new();
            for name in names {
                if let Some(answers) = self.exact.get(name) {
                    out.extend(answers.clone());
                    continue;
                }
                for (root, answers) in &self.wildcard_roots {
                    if name == root || name.ends_with(&format!(".{root}")) {
                        out.extend(answers.clone());
                        break;
                    }
                }
            }
            out
        }

        fn query_count(&self) -> u64 {
            self.queries.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn straight_resolve_with_no_wildcard_survives(
    ) {
        // Scenario 1 (§8): a plain A record with no wildcard behaviour anywhere.
        let resolver = Arc::new(MockResolver::new().with_exact("example.com", "127.0.0.1"));
        let wc = Wildcarder::new(resolver, 4, 3, Some(1));
        let result = wc.filter(vec!["example.com".to_string()]).await;
        assert_eq!(result.domains, vec!["example.com".to_string()]);
        assert!(result.roots.is_empty());
    }

    #[tokio::test]
    async fn simple_wildcard_is_classified_and_root_recorded() {
        // Scenario 3 (§8): test.com and every subdomain answer identically.
        let resolver = Arc::new(
            MockResolver::new()
                .with_exact("test.com", "192.168.0.5")
                .with_wildcard("test.com", "192.168.0.5"),
        );
        let wc = Wildcarder::new(resolver, 4, 3, Some(7));
        let result = wc.filter(vec!["www.test.com".to_string()]).await;
        assert!(result.domains.is_empty());
        assert_eq!(result.roots, vec!["test.com".to_string()]);
    }

    #[tokio::test]
    async fn nested_wildcard_reports_the_highest_root() {
        // Scenario 4 (§8), mirroring original_source/pkg/wildcarder/detectiontask_test.go's
        // "recurse to topmost" case: www.api.test.com's own apex answer (10.0.0.2)
        // is exactly what api.test.com hands out to any of its own random children,
        // so the climb continues past www.api.test.com. test.com shows no wildcard
        // behaviour at all (its random children are unmocked), so the climb stops
        // at api.test.com, which is reported as the root.
        let resolver = Arc::new(
            MockResolver::new()
                .with_exact("store.www.api.test.com", "10.0.0.1")
                .with_exact("www.api.test.com", "10.0.0.2")
                .with_exact("api.test.com", "10.0.0.3")
                .with_wildcard("www.api.test.com", "10.0.0.1")
                .with_wildcard("api.test.com", "10.0.0.2"),
        );
        let wc = Wildcarder::new(resolver, 4, 3, Some(11));
        let result = wc
            .filter(vec!["store.www.api.test.com".to_string()])
            .await;
        assert!(result.domains.is_empty());
        assert_eq!(result.roots, vec!["api.test.com".to_string()]);
    }

    #[tokio::test]
    async fn precache_hit_short_circuits_without_a_direct_lookup() {
        // Scenario 5 (§8): the pre-cache already holds www.test.com's (correct,
        // matching) answer; classification must still succeed via the root walk
        // from the probes plus the pre-cache re-check, without ever resolving
        // www.test.com directly against the trusted resolver.
        let resolver = Arc::new(
            MockResolver::new()
                .with_exact("test.com", "192.168.0.5")
                .with_wildcard("test.com", "192.168.0.5"),
        );
        let wc = Wildcarder::new(resolver, 4, 3, Some(5));

        let precache = Arc::new(DnsCache::new());
        precache.add(
            crate::hashing::hash_question("www.test.com"),
            &[DnsAnswer::new(RecordType::A, "192.168.0.5").hash()],
        );
        wc.set_pre_cache(precache);

        let result = wc.filter(vec!["www.test.com".to_string()]).await;
        assert!(result.domains.is_empty());
        assert_eq!(result.roots, vec!["test.com".to_string()]);
    }

    #[tokio::test]
    async fn precache_poisoned_entry_is_still_caught_by_direct_check() {
        // Scenario 6 (§8): the pre-cache holds a poisoned answer for
        // www.test.com that does not match the real wildcard IP; the
        // authoritative direct check (step 5) must still classify it wildcard.
        let resolver = Arc::new(
            MockResolver::new()
                .with_exact("test.com", "192.168.0.5")
                .with_exact("www.test.com", "192.168.0.5")
                .with_wildcard("test.com", "192.168.0.5"),
        );
        let wc = Wildcarder::new(resolver, 4, 3, Some(9));

        let precache = Arc::new(DnsCache::new());
        precache.add(
            crate::hashing::hash_question("www.test.com"),
            &[DnsAnswer::new(RecordType::A, "127.0.1.1").hash()],
        );
        wc.set_pre_cache(precache);

        let result = wc.filter(vec!["www.test.com".to_string()]).await;
        assert!(result.domains.is_empty());
        assert_eq!(result.roots, vec!["test.com".to_string()]);
    }

    #[tokio::test]
    async fn blank_lines_are_skipped_without_being_classified() {
        let resolver = Arc::new(MockResolver::new().with_exact("example.com", "1.2.3.4"));
        let wc = Wildcarder::new(resolver, 2, 3, Some(3));
        let result = wc
            .filter(vec!["".to_string(), "example.com".to_string(), "  ".to_string()])
            .await;
        assert_eq!(result.domains, vec!["example.com".to_string()]);
    }

    #[tokio::test]
    async fn current_is_zero_before_any_batch_and_matches_total_after() {
        let resolver = Arc::new(MockResolver::new().with_exact("example.com", "1.2.3.4"));
        let wc = Wildcarder::new(resolver, 2, 3, Some(2));
        assert_eq!(wc.current(), 0);
        wc.filter(vec!["example.com".to_string()]).await;
        assert_eq!(wc.current(), 1);
    }

    #[tokio::test]
    #[should_panic(expected = "concurrently")]
    async fn concurrent_filter_calls_panic() {
        let resolver = Arc::new(MockResolver::new());
        let wc = Arc::new(Wildcarder::new(resolver, 2, 1, Some(1)));
        let wc2 = wc.clone();

        // Hold the first call open past its first await point by racing a
        // second call against it on the same instance.
        let a = wc.filter(vec!["a.example.com".to_string(); 50]);
        let b = wc2.filter(vec!["b.example.com".to_string(); 50]);
        let _ = futures::join!(a, b);
    }
}

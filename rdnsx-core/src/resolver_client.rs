//! Batch A-record resolver used by the wildcard-detection engine (§4.5.7).
//!
//! Grounded on the teacher's `resolver.rs` (`hickory_resolver` construction from a
//! list of resolver address strings, `Semaphore`-bounded concurrency) and
//! `pkg/wildcarder/clientdns.go` (A-only resolution, retry loop, `QueryCount`).

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfig, NameServerConfigGroup, Protocol, ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::proto::rr::{Name, RData, RecordType as WireRecordType};
use hickory_resolver::TokioAsyncResolver;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::error::{PipelineError, Result};
use crate::hashing::{DnsAnswer, RecordType};

/// Resolves batches of names to their A-record answers, counting every DNS query
/// it issues on the wire. Resolver-level failures (timeout, SERVFAIL, NXDOMAIN, no
/// route) are absorbed here and surfaced as an empty answer set; they never reach
/// a `DetectionTask` as an error, since an unreachable resolver and a genuinely
/// absent record are indistinguishable to the caller by design (§4.5.7).
#[async_trait]
pub trait ResolverClient: Send + Sync {
    async fn resolve(&self, names: &[String]) -> Vec<DnsAnswer>;

    /// Total DNS wire queries issued so far, including retries.
    fn query_count(&self) -> u64;
}

/// A `ResolverClient` backed by `hickory-resolver`, round-robining over a fixed
/// resolver set with a simple per-resolver QPS pacer.
pub struct HickoryResolverClient {
    resolvers: Vec<TokioAsyncResolver>,
    pacers: Vec<Mutex<Instant>>,
    retry_count: u32,
    qps: u32,
    concurrency: Arc<Semaphore>,
    query_count: Arc<AtomicU64>,
    next: AtomicUsize,
}

impl HickoryResolverClient {
    /// `resolver_addrs` are bare IPs (`"8.8.8.8"`) or `ip:port` pairs; an empty list
    /// falls back to the system resolver configuration.
    pub fn new(
        resolver_addrs: &[String],
        retry_count: u32,
        qps: u32,
        concurrency: usize,
    ) -> Result<Self> {
        let mut resolvers = Vec::with_capacity(resolver_addrs.len().max(1));

        if resolver_addrs.is_empty() {
            resolvers.push(TokioAsyncResolver::tokio(
                ResolverConfig::default(),
                ResolverOpts::default(),
            ));
        } else {
            for addr in resolver_addrs {
                let socket = parse_resolver_addr(addr)?;
                let mut name_servers = NameServerConfigGroup::new();
                name_servers.push(NameServerConfig {
                    socket_addr: socket,
                    protocol: Protocol::Udp,
                    tls_dns_name: None,
                    trust_negative_responses: false,
                    bind_addr: None,
                });
                let mut cfg = ResolverConfig::new();
                cfg.add_name_server_config(name_servers);

                let mut opts = ResolverOpts::default();
                opts.attempts = 1;
                opts.timeout = Duration::from_secs(5);
                resolvers.push(TokioAsyncResolver::tokio(cfg, opts));
            }
        }

        let pacers = resolvers
            .iter()
            .map(|_| Mutex::new(Instant::now() - Duration::from_secs(1)))
            .collect();

        Ok(Self {
            resolvers,
            pacers,
            retry_count,
            qps,
            concurrency: Arc::new(Semaphore::new(concurrency.max(1))),
            query_count: Arc::new(AtomicU64::new(0)),
            next: AtomicUsize::new(0),
        })
    }

    fn pick(&self) -> usize {
        self.next.fetch_add(1, Ordering::Relaxed) % self.resolvers.len()
    }

    async fn pace(&self, idx: usize) {
        if self.qps == 0 {
            return;
        }
        let interval = Duration::from_secs_f64(1.0 / self.qps as f64);
        loop {
            let wait = {
                let mut last = self.pacers[idx].lock();
                let now = Instant::now();
                let elapsed = now.duration_since(*last);
                if elapsed >= interval {
                    *last = now;
                    None
                } else {
                    Some(interval - elapsed)
                }
            };
            match wait {
                None => return,
                Some(d) => tokio::time::sleep(d).await,
            }
        }
    }

    async fn resolve_one(&self, name: &str) -> Vec<DnsAnswer> {
        let fqdn = match Name::from_str(&format!("{name}.")) {
            Ok(n) => n,
            Err(_) => return Vec::new(),
        };

        let _permit = self.concurrency.acquire().await.ok();

        for attempt in 0..=self.retry_count {
            let idx = self.pick();
            self.pace(idx).await;
            self.query_count.fetch_add(1, Ordering::Relaxed);

            match self.resolvers[idx].query(fqdn.clone(), WireRecordType::A).await {
                Ok(response) => {
                    // A successful, empty response is authoritative (no record exists);
                    // retrying would only repeat the same answer.
                    return response
                        .records()
                        .iter()
                        .filter_map(|record| match record.data() {
                            Some(RData::A(ip)) => Some(DnsAnswer::new(RecordType::A, ip.to_string())),
                            _ => None,
                        })
                        .collect();
                }
                Err(e) => {
                    tracing::debug!(name, attempt, error = %e, "resolve attempt failed");
                    if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) || attempt == self.retry_count {
                        return Vec::new();
                    }
                }
            }
        }
        Vec::new()
    }
}

#[async_trait]
impl ResolverClient for HickoryResolverClient {
    async fn resolve(&self, names: &[String]) -> Vec<DnsAnswer> {
        if names.is_empty() {
            return Vec::new();
        }
        let futures = names.iter().map(|n| self.resolve_one(n));
        futures::future::join_all(futures)
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    fn query_count(&self) -> u64 {
        self.query_count.load(Ordering::Relaxed)
    }
}

fn parse_resolver_addr(addr: &str) -> Result<SocketAddr> {
    if let Ok(sock) = addr.parse::<SocketAddr>() {
        return Ok(sock);
    }
    format!("{addr}:53")
        .parse::<SocketAddr>()
        .map_err(|_| PipelineError::invalid_options(format!("invalid resolver address: {addr}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_ip_and_ip_port() {
        assert_eq!(
            parse_resolver_addr("8.8.8.8").unwrap(),
            "8.8.8.8:53".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            parse_resolver_addr("1.1.1.1:5353").unwrap(),
            "1.1.1.1:5353".parse::<SocketAddr>().unwrap()
        );
        assert!(parse_resolver_addr("not-an-address").is_err());
    }
}

//! The per-domain wildcard-detection algorithm (§4.5.3, §4.5.4).
//!
//! Grounded on `pkg/wildcarder/detectiontask.go` and `randomsub.go`. A
//! `DetectionTask` decides, for one candidate domain, whether it is a genuine
//! answer or the product of a DNS wildcard, walking up the candidate's ancestor
//! chain to find the highest zone that still answers identically to a
//! guaranteed-nonexistent probe.

use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use rand::Rng;

use crate::cache::{AnswerCache, DnsCache};
use crate::hashing::{hash_question, AnswerHash};
use crate::resolver_client::ResolverClient;

/// Fixed-width alphanumeric alphabet the donor draws wildcard probes from.
const PROBE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz1234567890";
const PROBE_LENGTH: usize = 16;

/// Draws `count` random 16-character probe labels, once per engine instance.
/// `seed` fixes the draw for deterministic tests; `None` draws from the OS RNG.
pub fn new_random_probes(count: usize, seed: Option<u64>) -> Vec<String> {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn draw(rng: &mut impl Rng, count: usize) -> Vec<String> {
        (0..count)
            .map(|_| {
                (0..PROBE_LENGTH)
                    .map(|_| PROBE_ALPHABET[rng.gen_range(0..PROBE_ALPHABET.len())] as char)
                    .collect()
            })
            .collect()
    }

    match seed {
        Some(s) => draw(&mut StdRng::seed_from_u64(s), count),
        None => draw(&mut rand::thread_rng(), count),
    }
}

/// Returns `domain`'s parent zone, or `None` if `domain` has no ancestor left to
/// test (one label, or already at a public-suffix-less root per the donor's plain
/// dot-count check: `strings.Count(domain, ".") <= 1`).
pub fn get_parent(domain: &str) -> Option<String> {
    if domain.matches('.').count() <= 1 {
        return None;
    }
    domain.split_once('.').map(|(_, rest)| rest.to_string())
}

/// Shared, read-mostly state every `DetectionTask` in a single `Filter` pass
/// operates against.
pub struct DetectionCtx {
    pub resolver: Arc<dyn ResolverClient>,
    pub wildcard_cache: Arc<AnswerCache>,
    pub pre_cache: Arc<DnsCache>,
    pub dns_cache: Arc<DnsCache>,
    pub probes: Arc<Vec<String>>,
    pub query_count: usize,
    pub results: Mutex<Vec<String>>,
}

/// Runs the full detection algorithm for one domain, recording it as a real
/// result if it survives every wildcard check.
pub async fn run(ctx: Arc<DetectionCtx>, domain: String) {
    if check_precache(&ctx, &domain) {
        return;
    }

    let root = match test_wildcard(&ctx, &domain).await {
        Some(root) => root,
        None => {
            add_domain(&ctx, domain);
            return;
        }
    };

    if check_precache(&ctx, &domain) {
        return;
    }

    if check_resolve(&ctx, &domain, &root).await {
        return;
    }

    add_domain(&ctx, domain);
}

fn add_domain(ctx: &DetectionCtx, domain: String) {
    ctx.results.lock().push(domain);
}

fn domain_is_wildcard(ctx: &DetectionCtx, domain: &str, answers: &[AnswerHash]) -> bool {
    match ctx.wildcard_cache.find_first(answers) {
        Some(roots) => roots.iter().any(|root| domain.ends_with(root.as_str())),
        None => false,
    }
}

/// Pre-cache shortcut: if `domain`'s already-known trusted answers match a
/// recorded wildcard root, classify it without issuing a single live query.
fn check_precache(ctx: &DetectionCtx, domain: &str) -> bool {
    let answers = ctx
        .pre_cache
        .find(hash_question(domain))
        .unwrap_or_default();
    domain_is_wildcard(ctx, domain, &answers)
}

/// Resolves `domain` against the trusted resolver(s), reusing `dns_cache` and
/// issuing `query_count` repeated queries the first time (§9 decision 3).
fn resolve_with_cache<'a>(
    ctx: &'a DetectionCtx,
    domain: &'a str,
) -> BoxFuture<'a, Vec<AnswerHash>> {
    Box::pin(async move {
        let question = hash_question(domain);
        if let Some(found) = ctx.dns_cache.find(question) {
            return found;
        }

        let first = ctx.resolver.resolve(&[domain.to_string()]).await;
        let first_hashes: Vec<AnswerHash> = first.iter().map(|a| a.hash()).collect();
        ctx.dns_cache.add(question, &first_hashes);
        if first.is_empty() {
            return Vec::new();
        }

        for _ in 1..ctx.query_count {
            let answers = ctx.resolver.resolve(&[domain.to_string()]).await;
            let hashes: Vec<AnswerHash> = answers.iter().map(|a| a.hash()).collect();
            ctx.dns_cache.add(question, &hashes);
        }

        ctx.dns_cache.find(question).unwrap_or_default()
    })
}

/// Resolves `k` random-label probes under `subdomain`'s parent zone, caching the
/// whole batch under the first probe's question-hash (`randomsub.go`).
fn resolve_random_subdomains<'a>(
    ctx: &'a DetectionCtx,
    subdomain: &'a str,
) -> BoxFuture<'a, Vec<AnswerHash>> {
    Box::pin(async move {
        let parent = match get_parent(subdomain) {
            Some(p) => p,
            None => return Vec::new(),
        };
        if ctx.probes.is_empty() {
            return Vec::new();
        }

        let probes: Vec<String> = ctx.probes.iter().map(|p| format!("{p}.{parent}")).collect();
        let question = hash_question(&probes[0]);

        if let Some(found) = ctx.dns_cache.find(question) {
            return found;
        }

        let first = ctx.resolver.resolve(&probes[0..1]).await;
        let first_hashes: Vec<AnswerHash> = first.iter().map(|a| a.hash()).collect();
        ctx.dns_cache.add(question, &first_hashes);
        if first.is_empty() {
            return Vec::new();
        }

        if probes.len() > 1 {
            let rest = ctx.resolver.resolve(&probes[1..]).await;
            let rest_hashes: Vec<AnswerHash> = rest.iter().map(|a| a.hash()).collect();
            ctx.dns_cache.add(question, &rest_hashes);
        }

        ctx.dns_cache.find(question).unwrap_or_default()
    })
}

fn answer_match(a: &[AnswerHash], b: &[AnswerHash]) -> bool {
    a.iter().any(|x| b.contains(x))
}

fn append_unique(into: &mut Vec<AnswerHash>, from: &[AnswerHash]) {
    for a in from {
        if !into.contains(a) {
            into.push(*a);
        }
    }
}

/// Walks from `domain`'s parent upward while each successive ancestor's real
/// answers keep matching its own random-probe answers, returning the highest
/// such ancestor (the wildcard root) together with every answer hash observed
/// along the way.
fn find_wildcard_root<'a>(
    ctx: &'a DetectionCtx,
    domain: &'a str,
    answers: Vec<AnswerHash>,
) -> BoxFuture<'a, (String, Vec<AnswerHash>)> {
    Box::pin(async move {
        let parent = match get_parent(domain) {
            Some(p) => p,
            None => return (domain.to_string(), answers),
        };

        let parent_answers = resolve_with_cache(ctx, &parent).await;
        let parent_random_answers = resolve_random_subdomains(ctx, &parent).await;

        if answer_match(&parent_answers, &parent_random_answers) {
            let mut merged = answers;
            append_unique(&mut merged, &parent_answers);
            append_unique(&mut merged, &parent_random_answers);
            find_wildcard_root(ctx, &parent, merged).await
        } else {
            (parent, answers)
        }
    })
}

/// Probes `domain`'s own zone for wildcard behaviour and, if found, walks the
/// ancestor chain to its root. Returns `None` when `domain`'s zone shows no
/// wildcard at all.
async fn test_wildcard(ctx: &DetectionCtx, domain: &str) -> Option<String> {
    let answers = resolve_random_subdomains(ctx, domain).await;
    if answers.is_empty() {
        return None;
    }
    let (root, answers) = find_wildcard_root(ctx, domain, answers).await;
    ctx.wildcard_cache.add(&root, &answers);
    Some(root)
}

/// Resolves `domain` for real and checks whether its answers match a known
/// wildcard root; if so, also seeds the answer cache with `domain`'s trusted
/// pre-cache answers against `root` so repeats short-circuit via `check_precache`.
async fn check_resolve(ctx: &DetectionCtx, domain: &str, root: &str) -> bool {
    let answers = resolve_with_cache(ctx, domain).await;
    if domain_is_wildcard(ctx, domain, &answers) {
        let pre = ctx
            .pre_cache
            .find(hash_question(domain))
            .unwrap_or_default();
        ctx.wildcard_cache.add(root, &pre);
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_of_single_label_host_is_none() {
        assert_eq!(get_parent("com"), None);
    }

    #[test]
    fn parent_requires_at_least_two_dots_in_the_child() {
        assert_eq!(get_parent("example.com"), None);
        assert_eq!(get_parent("www.example.com"), Some("example.com".to_string()));
        assert_eq!(
            get_parent("a.b.example.com"),
            Some("b.example.com".to_string())
        );
    }

    #[test]
    fn probes_are_sixteen_characters_from_the_fixed_alphabet() {
        let probes = new_random_probes(5, Some(1));
        assert_eq!(probes.len(), 5);
        for p in &probes {
            assert_eq!(p.len(), PROBE_LENGTH);
            assert!(p.bytes().all(|b| PROBE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn same_seed_is_deterministic() {
        assert_eq!(new_random_probes(3, Some(42)), new_random_probes(3, Some(42)));
    }
}

//! Performance benchmarks for the cache and hashing hot paths.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rdnsx_core::{hash_question, sanitize, AnswerCache, DnsAnswer, DnsCache, RecordType};
use std::time::Duration;

fn bench_hash_question(c: &mut Criterion) {
    c.bench_function("hash_question", |b| {
        b.iter(|| {
            black_box(hash_question("www.example.com"));
        });
    });
}

fn bench_sanitize(c: &mut Criterion) {
    c.bench_function("sanitize_wildcard_prefix", |b| {
        b.iter(|| {
            black_box(sanitize("*.Sub.Example.COM"));
        });
    });
}

fn bench_dns_cache_add(c: &mut Criterion) {
    let cache = DnsCache::new();
    let answers = vec![DnsAnswer::new(RecordType::A, "192.168.0.5").hash()];

    c.bench_function("dns_cache_add_existing_question", |b| {
        b.iter(|| {
            cache.add(black_box(42), black_box(&answers));
        });
    });
}

fn bench_answer_cache_find_first(c: &mut Criterion) {
    let cache = AnswerCache::new();
    let answer = DnsAnswer::new(RecordType::A, "192.168.0.5").hash();
    for i in 0..1000 {
        cache.add(&format!("root-{i}.example.com"), &[answer]);
    }

    c.bench_function("answer_cache_find_first_among_1000_roots", |b| {
        b.iter(|| {
            black_box(cache.find_first(&[answer]));
        });
    });
}

fn configure_criterion() -> Criterion {
    Criterion::default()
        .measurement_time(Duration::from_secs(5))
        .sample_size(100)
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches;
    config = configure_criterion();
    targets = bench_hash_question, bench_sanitize, bench_dns_cache_add, bench_answer_cache_find_first
}

criterion_main!(benches);

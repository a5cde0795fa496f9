//! Benchmarks for the pure retry leaves: backoff computation and error
//! classification.
//!
//! Run with: cargo bench -p lantern

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lantern::retry::RetryPolicy;
use std::time::Duration;

fn benchmark_compute_delay(c: &mut Criterion) {
    let policy = RetryPolicy {
        max_retries: 10,
        initial_delay: Duration::from_millis(1000),
        max_delay: Duration::from_millis(30_000),
        backoff_factor: 2.0,
        jitter: false,
        retry_on: None,
    };

    c.bench_function("compute_delay", |b| {
        b.iter(|| {
            for attempt in 1..=10u32 {
                let _ = lantern::backoff::compute_delay(black_box(attempt), &policy);
            }
        })
    });
}

fn benchmark_compute_delay_jittered(c: &mut Criterion) {
    let policy = RetryPolicy {
        jitter: true,
        ..RetryPolicy::default()
    };

    c.bench_function("compute_delay_jittered", |b| {
        b.iter(|| {
            let _ = lantern::backoff::compute_delay(black_box(5), &policy);
        })
    });
}

fn benchmark_classify_message(c: &mut Criterion) {
    let messages = [
        "signing request rejected",
        "insufficient balance: 0 tDUST available",
        "proof request timed out after 60s",
        "HTTP 503: service unavailable",
        "network unreachable",
        "something completely unexpected happened",
    ];

    c.bench_function("classify_message", |b| {
        b.iter(|| {
            for message in &messages {
                let _ = lantern::classify::classify_message(black_box(message));
            }
        })
    });
}

criterion_group!(
    benches,
    benchmark_compute_delay,
    benchmark_compute_delay_jittered,
    benchmark_classify_message,
);
criterion_main!(benches);

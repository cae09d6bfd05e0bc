//! Criterion benchmarks for the digest hot paths.
//!
//! Discover benches:
//!   cargo bench --bench digest -- --list
//!
//! Save a baseline:
//!   cargo bench --bench digest -- --save-baseline main

use std::hint::black_box;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tdigest_store::digest::wire;
use tdigest_store::Digest;

/// Deterministic pseudo-random values without pulling rand into benches.
fn synthetic_values(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed.wrapping_mul(0x9e3779b97f4a7c15) | 1;
    (0..n)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 11) as f64 / (1u64 << 53) as f64
        })
        .collect()
}

fn build_digest(n: usize, compression: f64, seed: u64) -> Digest {
    let mut d = Digest::new(compression);
    for v in synthetic_values(n, seed) {
        d.add(v, 1.0).expect("finite synthetic value");
    }
    d.flush();
    d
}

fn bench_ingest(c: &mut Criterion) {
    let mut g = c.benchmark_group("ingest_flush");
    for (n, compression) in [(100_000usize, 100.0f64), (1_000_000, 200.0)] {
        g.throughput(Throughput::Elements(n as u64));
        g.bench_function(
            BenchmarkId::from_parameter(format!("n={n},c={compression}")),
            |b| b.iter(|| black_box(build_digest(n, compression, 42))),
        );
    }
    g.finish();
}

fn bench_quantile(c: &mut Criterion) {
    let base = build_digest(1_000_000, 200.0, 123);

    let mut g = c.benchmark_group("quantile");
    g.bench_function("single_median", |b| {
        let mut d = base.clone();
        b.iter(|| black_box(d.quantile(black_box(0.5)).unwrap()));
    });

    let qs: Vec<f64> = (1..1000).map(|i| i as f64 / 1000.0).collect();
    g.throughput(Throughput::Elements(qs.len() as u64));
    g.bench_function("grid_1000", |b| {
        let mut d = base.clone();
        b.iter(|| {
            let mut acc = 0.0;
            for &q in &qs {
                acc += d.quantile(black_box(q)).unwrap();
            }
            black_box(acc)
        });
    });
    g.finish();
}

fn bench_cdf(c: &mut Criterion) {
    let base = build_digest(1_000_000, 200.0, 999);
    let xs: Vec<f64> = (0..1000).map(|i| i as f64 / 999.0).collect();

    let mut g = c.benchmark_group("cdf");
    g.throughput(Throughput::Elements(xs.len() as u64));
    g.bench_function("grid_1000", |b| {
        let mut d = base.clone();
        b.iter(|| {
            let mut acc = 0.0;
            for &x in &xs {
                acc += d.cdf(black_box(x)).unwrap();
            }
            black_box(acc)
        });
    });
    g.finish();
}

fn bench_merge(c: &mut Criterion) {
    let a = build_digest(500_000, 100.0, 7);
    let b_src = build_digest(500_000, 100.0, 8);

    let mut g = c.benchmark_group("merge");
    g.bench_function("two_halves", |b| {
        b.iter(|| {
            let mut dest = Digest::new(100.0);
            dest.absorb(a.centroids());
            dest.absorb(b_src.centroids());
            dest.flush();
            black_box(dest)
        });
    });
    g.finish();
}

fn bench_codec(c: &mut Criterion) {
    let mut d = build_digest(1_000_000, 200.0, 55);
    let bytes = wire::encode(&mut d);

    let mut g = c.benchmark_group("codec");
    g.bench_function("encode", |b| {
        b.iter(|| black_box(wire::encode(black_box(&mut d))));
    });
    g.bench_function("decode", |b| {
        b.iter(|| black_box(wire::decode(black_box(&bytes)).unwrap()));
    });
    g.finish();
}

fn configure() -> Criterion {
    Criterion::default()
        .warm_up_time(Duration::from_secs(1))
        .measurement_time(Duration::from_secs(2))
        .sample_size(30)
        .without_plots()
}

criterion_group!(
    name = digest_benches;
    config = configure();
    targets = bench_ingest, bench_quantile, bench_cdf, bench_merge, bench_codec
);

criterion_main!(digest_benches);

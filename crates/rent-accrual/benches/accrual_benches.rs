//! Criterion benchmarks for rent accrual.
//!
//! Covers: cost computation, single settlement, settlement over mixed
//! account shapes, and migration grant.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rent_accrual::engine::RentEngine;
use rent_accrual::migration::migrate;
use rent_core::ledger::RentRecord;
use rent_core::traits::RentCalculator;

fn bench_cost_per_block(c: &mut Criterion) {
    let engine = RentEngine::default();

    c.bench_function("cost_per_block", |b| {
        b.iter(|| engine.cost_per_block(black_box(120), black_box(4_096)))
    });
}

fn bench_settle(c: &mut Criterion) {
    let engine = RentEngine::default();
    // A contract with a few KiB of code and a populated storage map.
    let record = RentRecord::derive(&engine, 10_000_000_000, 1_000, 4_096, 120);

    c.bench_function("settle_1000_blocks", |b| {
        b.iter(|| engine.settle(black_box(&record), black_box(2_000)))
    });
}

fn bench_settle_mixed(c: &mut Criterion) {
    let engine = RentEngine::default();
    let mut rng = StdRng::seed_from_u64(11);
    let records: Vec<(RentRecord, u64)> = (0..1_024)
        .map(|_| {
            let last_paid = rng.gen_range(1..100_000);
            let record = RentRecord::derive(
                &engine,
                rng.gen_range(0..1_000_000_000),
                last_paid,
                rng.gen_range(0..10_000),
                rng.gen_range(0..800),
            );
            (record, last_paid + rng.gen_range(0..50_000))
        })
        .collect();

    c.bench_function("settle_mixed_1024", |b| {
        b.iter(|| {
            records
                .iter()
                .map(|(r, at)| engine.settle(black_box(r), *at).charged)
                .fold(0u64, u64::saturating_add)
        })
    });
}

fn bench_migrate(c: &mut Criterion) {
    let engine = RentEngine::default();
    let record = RentRecord::unsettled(&engine, 4_096, 120);

    c.bench_function("migrate_unsettled", |b| {
        b.iter(|| migrate(&engine, black_box(&record), black_box(1)))
    });
}

criterion_group!(
    benches,
    bench_cost_per_block,
    bench_settle,
    bench_settle_mixed,
    bench_migrate
);
criterion_main!(benches);

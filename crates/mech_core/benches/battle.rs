//! Battle tick benchmarks for mech_core.
//!
//! Run with: `cargo bench -p mech_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use mech_core::battle::Battle;
use mech_test_utils::fixtures::{duel, fire_at_will, skirmish};

/// Tick throughput for small battles under continuous fire.
pub fn battle_benchmark(c: &mut Criterion) {
    c.bench_function("duel_60_ticks", |b| {
        b.iter_batched(
            || duel(1).0,
            |mut battle| {
                for _ in 0..60 {
                    black_box(fire_at_will(&mut battle));
                }
                battle
            },
            BatchSize::SmallInput,
        );
    });

    // Warm up so projectiles are in flight
    let mut warm = skirmish(1);
    for _ in 0..300 {
        fire_at_will(&mut warm);
    }
    c.bench_function("skirmish_tick", |b| {
        b.iter_batched(
            || warm.clone(),
            |mut battle| black_box(fire_at_will(&mut battle)),
            BatchSize::SmallInput,
        );
    });
}

/// Cost of the determinism primitives.
pub fn snapshot_benchmark(c: &mut Criterion) {
    let mut battle = skirmish(1);
    for _ in 0..300 {
        fire_at_will(&mut battle);
    }

    c.bench_function("state_hash", |b| b.iter(|| black_box(battle.state_hash())));
    c.bench_function("snapshot_restore", |b| {
        b.iter(|| {
            let bytes = battle.snapshot().unwrap_or_default();
            black_box(Battle::restore(&bytes).ok())
        });
    });
}

criterion_group!(benches, battle_benchmark, snapshot_benchmark);
criterion_main!(benches);

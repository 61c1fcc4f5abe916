//! Criterion benchmarks for staged player-list maintenance.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use simexec_bench::fleet_profile;
use simexec_test_utils::local_player;

/// Benchmark: stage 64 new players into a 1000-player list and publish.
fn bench_insert_64_into_1k(c: &mut Criterion) {
    c.bench_function("maintain_insert_64_into_1k", |b| {
        b.iter_batched(
            || {
                let sim = fleet_profile(1000, 1).unwrap();
                for i in 0..64u16 {
                    let name = format!("new{i}");
                    sim.add_new_player(&name, Arc::new(local_player(&name, 2000 + i)))
                        .unwrap();
                }
                sim
            },
            |sim| {
                assert!(sim.maintain_list());
                sim
            },
            BatchSize::LargeInput,
        );
    });
}

/// Benchmark: drop every tenth player of a 1000-player list.
fn bench_remove_tenth_of_1k(c: &mut Criterion) {
    c.bench_function("maintain_remove_100_of_1k", |b| {
        b.iter_batched(
            || {
                let sim = fleet_profile(1000, 1).unwrap();
                for entry in sim.players().iter().step_by(10) {
                    entry.player.request_delete();
                }
                sim
            },
            |sim| {
                assert!(sim.maintain_list());
                sim
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_insert_64_into_1k, bench_remove_tenth_of_1k);
criterion_main!(benches);

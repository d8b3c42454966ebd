//! Simulation benchmarks for rpg_core.
//!
//! Run with: `cargo bench -p rpg_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rpg_core::combat::{hit_chance_between, AttackType};
use rpg_core::math::Fixed;
use rpg_core::skills::{level_for_xp, MAX_XP};
use rpg_test_utils::fixtures::{advance, geared_combatant, ready_world, spawn_npc, vec3};

/// Hit chance for a geared matchup.
pub fn combat_benchmark(c: &mut Criterion) {
    let attacker = geared_combatant(75, 90, 10);
    let defender = geared_combatant(70, 5, 120);

    c.bench_function("hit_chance_between", |b| {
        b.iter(|| {
            hit_chance_between(
                black_box(&attacker),
                black_box(&defender),
                black_box(AttackType::Melee),
            )
        })
    });

    c.bench_function("level_for_xp", |b| {
        b.iter(|| level_for_xp(black_box(MAX_XP / 3)))
    });
}

/// One second of world time with many entities walking.
pub fn navigation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("navigation_second");

    for count in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter_batched(
                || {
                    let (mut world, clock) = ready_world();
                    for i in 0..count {
                        let id = spawn_npc(&mut world, &format!("npc_{i}"), vec3(i, 0, 0));
                        world.navigate_to(&id, vec3(i, 0, 500), Some(Fixed::from_num(4)), None);
                    }
                    (world, clock)
                },
                |(mut world, clock)| advance(&mut world, &clock, 1_000),
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, combat_benchmark, navigation_benchmark);
criterion_main!(benches);

//! Tick throughput with a crowded arena.

use arena_sim::{EnemyKind, SimConfig, SimWorld, UpgradeKind};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn crowded_world(enemies: usize) -> SimWorld {
    let config = SimConfig {
        pause_on_level_up: false,
        spawn_interval: 1_000.0,
        min_spawn_interval: 1_000.0,
        ..SimConfig::default()
    };
    let mut sim = SimWorld::with_config(config);
    for kind in [UpgradeKind::Multishot, UpgradeKind::Piercing, UpgradeKind::ToxicCoating] {
        sim.world_mut().resource_mut::<arena_sim::Build>().acquire(kind);
    }

    let kinds = EnemyKind::ALL;
    for i in 0..enemies {
        let angle = i as f32 * 0.618 * std::f32::consts::TAU;
        let dist = 120.0 + (i % 40) as f32 * 8.0;
        sim.spawn_enemy(kinds[i % kinds.len()], angle.cos() * dist, angle.sin() * dist);
    }
    sim
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    for enemies in [100usize, 500, 2_000] {
        group.bench_with_input(BenchmarkId::from_parameter(enemies), &enemies, |b, &n| {
            let mut sim = crowded_world(n);
            b.iter(|| {
                if !sim.tick(black_box(1.0 / 60.0)) {
                    sim = crowded_world(n);
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_tick);
criterion_main!(benches);

//! Criterion micro-benchmarks for zone resolution and strike hit tests.

use criterion::{criterion_group, criterion_main, Criterion};
use fray_bench::{reference_profile, ZONE_SIZE};
use fray_combat::{prepare, AbilityCatalog, CasterSide};
use fray_core::{AbilityName, AgentId, Combatant, EntityId, PlayerId, Stats, Vec2, ZoneId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::hint::black_box;

fn random_points(n: usize, extent: f32, seed: u64) -> Vec<Vec2> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| Vec2::new(rng.random_range(0.0..extent), rng.random_range(0.0..extent)))
        .collect()
}

/// Benchmark: resolve 1000 positions to their owning zone.
fn bench_resolve_1k(c: &mut Criterion) {
    let (_, topology) = reference_profile(0);
    let points = random_points(1000, ZONE_SIZE * 3.0, 1);

    c.bench_function("resolve_1k", |b| {
        b.iter(|| {
            for &p in &points {
                black_box(topology.resolve(ZoneId(5), p));
            }
        });
    });
}

/// Benchmark: active zone sets for 1000 positions inside the centre zone.
fn bench_active_zone_set_1k(c: &mut Criterion) {
    let (_, topology) = reference_profile(0);
    let points: Vec<Vec2> = random_points(1000, ZONE_SIZE, 2)
        .into_iter()
        .map(|p| p + Vec2::splat(ZONE_SIZE))
        .collect();

    c.bench_function("active_zone_set_1k", |b| {
        b.iter(|| {
            for &p in &points {
                black_box(topology.active_zone_set(ZoneId(5), p));
            }
        });
    });
}

struct Target {
    id: EntityId,
    pos: Vec2,
    stats: Stats,
}

impl Combatant for Target {
    fn entity_id(&self) -> EntityId {
        self.id
    }
    fn position(&self) -> Vec2 {
        self.pos
    }
    fn stats(&self) -> &Stats {
        &self.stats
    }
    fn stats_mut(&mut self) -> &mut Stats {
        &mut self.stats
    }
    fn sprite_height(&self) -> f32 {
        64.0
    }
    fn collision_radius(&self) -> f32 {
        38.4
    }
}

/// Benchmark: a ColossalSweep landing on 500 agents spread over 1000 px.
fn bench_sweep_500(c: &mut Criterion) {
    let catalog = AbilityCatalog::default();
    let mut caster = Target {
        id: PlayerId(1).into(),
        pos: Vec2::splat(500.0),
        stats: Stats::new(100, 100, 10),
    };
    let mut agents: Vec<Target> = random_points(500, 1000.0, 3)
        .into_iter()
        .enumerate()
        .map(|(i, pos)| Target {
            id: AgentId(i as u64).into(),
            pos,
            stats: Stats::new(1_000, 0, 0),
        })
        .collect();

    c.bench_function("sweep_500", |b| {
        b.iter(|| {
            caster.stats.refill();
            for agent in &mut agents {
                agent.stats.refill();
            }
            let mut sweep = catalog
                .instance(AbilityName::ColossalSweep, CasterSide::Player)
                .expect("default catalog has ColossalSweep");
            let strike = prepare(&mut caster, &mut sweep, 0).expect("ready");
            let targets = agents.iter_mut().map(|a| a as &mut dyn Combatant);
            black_box(strike.apply(targets));
        });
    });
}

criterion_group!(
    benches,
    bench_resolve_1k,
    bench_active_zone_set_1k,
    bench_sweep_500
);
criterion_main!(benches);

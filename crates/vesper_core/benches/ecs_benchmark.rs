//! # ECS Performance Benchmark
//!
//! ARCHITECT'S REQUIREMENTS:
//! - Entity create/destroy is O(1) amortized
//! - Component attach/detach never scans the world
//! - A simulation tick touches only tracked entities
//!
//! Run with: `cargo bench --package vesper_core`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use vesper_core::{Component, ComponentMask, CoreConfig, System, SystemContext, World};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Transform {
    x: f32,
    y: f32,
    z: f32,
}

impl Component for Transform {
    const ID: u8 = 0;
    const MAX_POOL_SIZE: usize = 16_384;
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Velocity {
    x: f32,
    y: f32,
    z: f32,
}

impl Component for Velocity {
    const ID: u8 = 1;
    const MAX_POOL_SIZE: usize = 16_384;
}

struct MovementSystem;

impl System for MovementSystem {
    fn required_mask(&self) -> ComponentMask {
        ComponentMask::empty().with::<Transform>().with::<Velocity>()
    }

    fn process(&mut self, ctx: SystemContext<'_>, dt: f32) {
        for &entity in ctx.entities {
            let velocity = *ctx.components.get_component::<Velocity>(entity);
            let transform = ctx.components.get_component_mut::<Transform>(entity);
            transform.x += velocity.x * dt;
            transform.y += velocity.y * dt;
            transform.z += velocity.z * dt;
        }
    }
}

fn bench_config() -> CoreConfig {
    CoreConfig {
        min_free_ids: 8192,
        initial_pool_size: 1024,
        ..CoreConfig::default()
    }
}

/// Benchmark: mint and commit-destroy entities, exercising the free list.
fn bench_create_destroy(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_destroy");

    for count in [1_000usize, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut world = World::with_config(&bench_config());
                let entities: Vec<_> = (0..count).map(|_| world.create_entity()).collect();
                world.simulate(0.0);
                for entity in entities {
                    world.destroy_entity(entity);
                }
                world.simulate(0.0);
                world.entity_count()
            });
        });
    }

    group.finish();
}

/// Benchmark: attach/detach a component without invalidating the pool.
fn bench_component_churn(c: &mut Criterion) {
    let mut world = World::with_config(&bench_config());
    let entities: Vec<_> = (0..4_096).map(|_| world.create_entity()).collect();
    world.simulate(0.0);

    // deterministic churn order
    let mut order = entities.clone();
    let mut rng = StdRng::seed_from_u64(0x5EED);
    order.shuffle(&mut rng);

    c.bench_function("component_churn_4096", |b| {
        b.iter(|| {
            for &entity in &order {
                black_box(world.add_component(entity, Velocity { x: 1.0, y: 2.0, z: 3.0 }));
            }
            for &entity in &order {
                world.remove_component::<Velocity>(entity);
            }
        });
    });
}

/// THE CRITICAL BENCHMARK: one tick over a fully subscribed working set.
fn bench_simulate_tick(c: &mut Criterion) {
    let mut world = World::with_config(&bench_config());
    world.add_system(MovementSystem);

    for i in 0..8_192u32 {
        let entity = world.create_entity();
        let f = i as f32;
        world.add_component(entity, Transform { x: f, y: f, z: f });
        world.add_component(entity, Velocity { x: 0.1, y: 0.2, z: 0.3 });
    }
    world.simulate(0.0);

    c.bench_function("simulate_tick_8192", |b| {
        b.iter(|| {
            world.simulate(black_box(0.016));
        });
    });
}

criterion_group!(
    benches,
    bench_create_destroy,
    bench_component_churn,
    bench_simulate_tick
);
criterion_main!(benches);

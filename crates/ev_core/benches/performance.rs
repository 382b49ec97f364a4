//! Performance benchmarks for ev_core using Criterion.rs.

use bevy_ecs::prelude::{Entity, World};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ev_core::clock::{EventKind, SimulationClock};
use ev_core::policy::ChargingPolicyKind;
use ev_core::runner::{initialize_simulation, run_until_empty, simulation_schedule};
use ev_core::scenario::{build_scenario, ScenarioParams};
use ev_core::storage::{LockHolder, StationStorage};

fn bench_simulation_run(c: &mut Criterion) {
    let scenarios = vec![("small", 50, 1), ("medium", 200, 3), ("large", 1000, 10)];

    let mut group = c.benchmark_group("simulation_run");
    for (name, users, slots) in scenarios {
        group.bench_with_input(
            BenchmarkId::from_parameter(name),
            &(users, slots),
            |b, &(users, slots)| {
                b.iter(|| {
                    let mut world = World::new();
                    let params = ScenarioParams::default()
                        .with_seed(42)
                        .with_users(users, 3)
                        .with_max_concurrent_charges(slots)
                        .with_departure_window_hours(1);
                    build_scenario(&mut world, params).expect("valid scenario");
                    initialize_simulation(&mut world);
                    let mut schedule = simulation_schedule();
                    black_box(run_until_empty(&mut world, &mut schedule, 1_000_000));
                });
            },
        );
    }
    group.finish();
}

fn bench_storage_policies(c: &mut Criterion) {
    let vehicles: Vec<Entity> = (0..1_000).map(Entity::from_raw).collect();

    let mut group = c.benchmark_group("storage_fill_drain");
    for kind in ChargingPolicyKind::ALL {
        group.bench_function(kind.name(), |b| {
            b.iter(|| {
                let mut storage = StationStorage::new(vehicles.len(), kind);
                let holder = LockHolder::Startup;
                storage.lock(holder);
                for &v in &vehicles {
                    storage.add_vehicle(v).expect("room");
                }
                while let Some(v) = storage.pop_vehicle() {
                    black_box(storage.charged(v));
                }
                storage.unlock(holder).expect("held");
            });
        });
    }
    group.finish();
}

fn bench_clock(c: &mut Criterion) {
    c.bench_function("clock_schedule_pop_10k", |b| {
        b.iter(|| {
            let mut clock = SimulationClock::default();
            for i in 0..10_000u64 {
                clock.schedule_at((i * 7919) % 100_000, EventKind::UserArrives, None);
            }
            while let Some(event) = clock.pop_next() {
                black_box(event);
            }
        });
    });
}

criterion_group!(
    benches,
    bench_simulation_run,
    bench_storage_policies,
    bench_clock
);
criterion_main!(benches);

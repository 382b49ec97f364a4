use bevy_ecs::prelude::{Entity, World};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clock::SimulationClock;
use crate::error::{ConfigError, Result};
use crate::profiling::EventMetrics;
use crate::scenario::params::{ScenarioParams, SimulationEndTimeMs};
use crate::spatial::Point;
use crate::station::Station;
use crate::telemetry::SimTelemetry;
use crate::user::{User, UserConfig};
use crate::vehicle::{Vehicle, VehicleKind, VehicleSpecs};

/// Entities spawned by [build_scenario], in creation order.
#[derive(Debug, Clone, Default)]
pub struct ScenarioEntities {
    pub stations: Vec<Entity>,
    pub users: Vec<Entity>,
    pub vehicles: Vec<Entity>,
}

fn random_vehicle<R: Rng>(
    rng: &mut R,
    specs: &VehicleSpecs,
    params: &ScenarioParams,
) -> Vehicle {
    let kind = if rng.gen::<f64>() < params.bike_share {
        VehicleKind::Bike
    } else {
        VehicleKind::Scooter
    };
    let spec = specs.get(kind);
    let fraction = if params.max_initial_battery > params.min_initial_battery {
        rng.gen_range(params.min_initial_battery..=params.max_initial_battery)
    } else {
        params.min_initial_battery
    };
    Vehicle::new(kind, spec).with_capacity_left(spec.battery_capacity * fraction)
}

/// Populate `world` with resources, stations, parked vehicles and users.
///
/// Vehicle constants come from a [VehicleSpecs] resource already in the world,
/// or the defaults. Call [crate::runner::initialize_simulation] afterwards.
pub fn build_scenario(world: &mut World, params: ScenarioParams) -> Result<ScenarioEntities> {
    params.validate()?;

    let seed = params.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let specs = world
        .get_resource::<VehicleSpecs>()
        .cloned()
        .unwrap_or_default();

    world.insert_resource(SimulationClock::default());
    world.insert_resource(SimTelemetry::default());
    world.insert_resource(EventMetrics::default());
    world.insert_resource(UserConfig {
        seed: seed.wrapping_add(0x00ca_fe00),
        dwell_ms: params.dwell_ms,
        patience_ms: params.patience_ms,
    });
    if let Some(end_ms) = params.simulation_end_time_ms {
        world.insert_resource(SimulationEndTimeMs(end_ms));
    }

    let mut entities = ScenarioEntities::default();
    let positions = params.layout.positions(&mut rng);
    let mut station_sites: Vec<(Entity, Point)> = Vec::with_capacity(positions.len());

    for (id, position) in positions.into_iter().enumerate() {
        // Only vehicles that need energy queue for a slot; full ones stay parked.
        let mut needs_charge = Vec::with_capacity(params.deployed_per_station);
        for _ in 0..params.deployed_per_station {
            let vehicle = random_vehicle(&mut rng, &specs, &params);
            let charged = vehicle.is_charged();
            let entity = world.spawn(vehicle).id();
            entities.vehicles.push(entity);
            if !charged {
                needs_charge.push(entity);
            }
        }
        let mut storage = params.station_storage();
        storage
            .deploy(&needs_charge)
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;

        let station = Station::new(
            id,
            position,
            params.charging_time_ms,
            params.max_concurrent_charges,
            storage,
        )
        .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        let station = world.spawn(station).id();
        entities.stations.push(station);
        station_sites.push((station, position));
    }

    for _ in 0..params.num_users {
        let vehicle = world.spawn(random_vehicle(&mut rng, &specs, &params)).id();
        let (home, location) = station_sites[rng.gen_range(0..station_sites.len())];
        let departs_at = rng.gen_range(0..=params.departure_window_ms);
        let user = world
            .spawn(
                User::new(vehicle, location, Some(home), params.trips_per_user)
                    .with_departure(departs_at),
            )
            .id();
        if let Some(mut v) = world.get_mut::<Vehicle>(vehicle) {
            v.user = Some(user);
        }
        entities.vehicles.push(vehicle);
        entities.users.push(user);
    }

    world.insert_resource(specs);
    log::info!(
        "built scenario: {} stations ({} policy, {} slots, queue {}), {} users, seed {}",
        entities.stations.len(),
        params.policy.name(),
        params.max_concurrent_charges,
        params.storage_capacity,
        entities.users.len(),
        seed
    );
    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::StationLayout;
    use crate::user::UserState;

    #[test]
    fn builds_stations_users_and_parked_vehicles() {
        let mut world = World::new();
        let params = ScenarioParams::default()
            .with_seed(11)
            .with_layout(StationLayout::Grid {
                rows: 2,
                columns: 2,
                spacing_km: 1.0,
            })
            .with_users(5, 2)
            .with_deployed_per_station(2)
            .with_storage_capacity(3);

        let entities = build_scenario(&mut world, params).expect("build");
        assert_eq!(entities.stations.len(), 4);
        assert_eq!(entities.users.len(), 5);
        assert_eq!(entities.vehicles.len(), 4 * 2 + 5);

        for &station in &entities.stations {
            let s = world.entity(station).get::<Station>().expect("station");
            assert_eq!(s.storage().count(), 2);
            assert_eq!(s.storage().capacity(), 3);
        }
        for &user in &entities.users {
            let u = world.entity(user).get::<User>().expect("user");
            assert_eq!(u.state, UserState::Idle);
            assert_eq!(u.trips_remaining, 2);
            let v = world.entity(u.vehicle).get::<Vehicle>().expect("vehicle");
            assert_eq!(v.user, Some(user));
            assert!(v.battery_fraction() >= 0.6 - 1e-9);
        }
        assert!(world.get_resource::<UserConfig>().is_some());
        assert!(world.get_resource::<VehicleSpecs>().is_some());
    }

    #[test]
    fn same_seed_builds_the_same_world() {
        let build = || {
            let mut world = World::new();
            let params = ScenarioParams::default()
                .with_seed(5)
                .with_layout(StationLayout::SquareRandom { size: 10, count: 4 })
                .with_users(8, 1);
            let entities = build_scenario(&mut world, params).expect("build");
            entities
                .users
                .iter()
                .map(|&u| {
                    let user = world.entity(u).get::<User>().expect("user");
                    (user.location, user.departs_at)
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn fully_charged_vehicles_are_parked_outside_the_queue() {
        let mut world = World::new();
        let params = ScenarioParams::default()
            .with_seed(4)
            .with_layout(StationLayout::Grid {
                rows: 3,
                columns: 3,
                spacing_km: 1.0,
            })
            .with_users(0, 1)
            .with_deployed_per_station(2)
            .with_initial_battery(1.0, 1.0);

        let entities = build_scenario(&mut world, params).expect("build");
        assert_eq!(entities.vehicles.len(), 18);
        for &station in &entities.stations {
            let s = world.entity(station).get::<Station>().expect("station");
            assert!(s.storage().is_empty());
        }
    }

    #[test]
    fn dual_stack_stations_split_deployed_vehicles() {
        let mut world = World::new();
        let params = ScenarioParams::default()
            .with_seed(8)
            .with_layout(StationLayout::Grid {
                rows: 1,
                columns: 1,
                spacing_km: 1.0,
            })
            .with_users(0, 1)
            .with_storage_capacity(4)
            .with_dual_stack_split(1)
            .with_deployed_per_station(3)
            .with_initial_battery(0.2, 0.5);

        let entities = build_scenario(&mut world, params).expect("build");
        let s = world
            .entity(entities.stations[0])
            .get::<Station>()
            .expect("station");
        let stacks = s.storage().stacks().expect("dual stack");
        assert_eq!(stacks.remove_stack().len(), 1);
        assert_eq!(stacks.insert_stack().len(), 2);
    }

    #[test]
    fn invalid_params_are_rejected_before_spawning() {
        let mut world = World::new();
        let params = ScenarioParams::default().with_max_concurrent_charges(0);
        assert!(build_scenario(&mut world, params).is_err());
        assert_eq!(world.entities().len(), 0);
    }
}

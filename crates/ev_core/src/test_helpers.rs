//! Test helpers for common test setup and utilities.
//!
//! This module provides shared test utilities to reduce duplication across test files.

use bevy_ecs::prelude::{Entity, World};

use crate::clock::SimulationClock;
use crate::policy::ChargingPolicyKind;
use crate::spatial::Point;
use crate::station::Station;
use crate::storage::StationStorage;
use crate::telemetry::SimTelemetry;
use crate::user::{User, UserConfig};
use crate::vehicle::{Vehicle, VehicleKind, VehicleSpec};

/// A small vehicle whose numbers are easy to reason about: 100 energy units,
/// 10 per km, 10 km/h.
pub fn test_vehicle_spec() -> VehicleSpec {
    VehicleSpec {
        battery_capacity: 100.0,
        energy_consumption: 10.0,
        velocity: 10.0,
    }
}

/// Create a basic test world with essential resources.
///
/// This is a convenience function for tests that need a minimal world setup.
/// For more complex scenarios, use the full `build_scenario` function.
pub fn create_test_world() -> World {
    let mut world = World::new();
    world.insert_resource(SimulationClock::default());
    world.insert_resource(SimTelemetry::default());
    world.insert_resource(UserConfig::default());
    world
}

pub fn spawn_station(
    world: &mut World,
    id: usize,
    position: Point,
    charging_time_ms: u64,
    slots: usize,
    queue: usize,
    policy: ChargingPolicyKind,
) -> Entity {
    let station = Station::new(
        id,
        position,
        charging_time_ms,
        slots,
        StationStorage::new(queue, policy),
    )
    .expect("station");
    world.spawn(station).id()
}

/// Spawn a user at `home` driving a fresh test vehicle charged to `capacity_left`.
/// Returns `(user, vehicle)`.
pub fn spawn_user(
    world: &mut World,
    home: Entity,
    location: Point,
    capacity_left: f64,
    trips: u32,
) -> (Entity, Entity) {
    let vehicle = world
        .spawn(Vehicle::new(VehicleKind::Bike, test_vehicle_spec()).with_capacity_left(capacity_left))
        .id();
    let user = world
        .spawn(User::new(vehicle, location, Some(home), trips))
        .id();
    if let Some(mut v) = world.get_mut::<Vehicle>(vehicle) {
        v.user = Some(user);
    }
    (user, vehicle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawned_user_owns_its_vehicle() {
        let mut world = create_test_world();
        let home = spawn_station(
            &mut world,
            0,
            Point::default(),
            1_000,
            1,
            1,
            ChargingPolicyKind::Fifo,
        );
        let (user, vehicle) = spawn_user(&mut world, home, Point::default(), 40.0, 1);
        let v = world.entity(vehicle).get::<Vehicle>().expect("vehicle");
        assert_eq!(v.user, Some(user));
        assert_eq!(v.capacity_left(), 40.0);
        assert_eq!(
            world.entity(user).get::<User>().expect("user").station,
            Some(home)
        );
    }
}

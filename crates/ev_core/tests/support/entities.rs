#![allow(dead_code)]

use bevy_ecs::prelude::{Entity, World};
use ev_core::policy::ChargingPolicyKind;
use ev_core::spatial::Point;
use ev_core::station::Station;
use ev_core::storage::StationStorage;
use ev_core::test_helpers::test_vehicle_spec;
use ev_core::user::User;
use ev_core::vehicle::{Vehicle, VehicleKind, VehicleSpec};

/// Builder for station fixtures.
#[derive(Clone, Debug)]
pub struct StationBuilder {
    id: usize,
    position: Point,
    charging_time_ms: u64,
    slots: usize,
    queue: usize,
    policy: ChargingPolicyKind,
    parked: Vec<Entity>,
}

impl Default for StationBuilder {
    fn default() -> Self {
        Self {
            id: 0,
            position: Point::default(),
            charging_time_ms: 1_000,
            slots: 1,
            queue: 4,
            policy: ChargingPolicyKind::Fifo,
            parked: Vec::new(),
        }
    }
}

impl StationBuilder {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Point::new(x, y);
        self
    }

    pub fn with_charging_time_ms(mut self, ms: u64) -> Self {
        self.charging_time_ms = ms;
        self
    }

    pub fn with_slots(mut self, slots: usize) -> Self {
        self.slots = slots;
        self
    }

    pub fn with_queue(mut self, queue: usize) -> Self {
        self.queue = queue;
        self
    }

    pub fn with_policy(mut self, policy: ChargingPolicyKind) -> Self {
        self.policy = policy;
        self
    }

    /// Vehicles already waiting when the run starts.
    pub fn with_parked(mut self, vehicles: &[Entity]) -> Self {
        self.parked = vehicles.to_vec();
        self
    }

    pub fn spawn(self, world: &mut World) -> Entity {
        let mut storage = StationStorage::new(self.queue, self.policy);
        storage.deploy(&self.parked).expect("parked vehicles fit");
        let station = Station::new(
            self.id,
            self.position,
            self.charging_time_ms,
            self.slots,
            storage,
        )
        .expect("station");
        world.spawn(station).id()
    }
}

/// Builder for a user plus the vehicle it drives.
#[derive(Clone, Debug)]
pub struct UserBuilder {
    home: Entity,
    location: Point,
    spec: VehicleSpec,
    capacity_left: Option<f64>,
    trips: u32,
    departs_at: u64,
}

impl UserBuilder {
    pub fn new(home: Entity, location: Point) -> Self {
        Self {
            home,
            location,
            spec: test_vehicle_spec(),
            capacity_left: None,
            trips: 1,
            departs_at: 0,
        }
    }

    pub fn with_spec(mut self, spec: VehicleSpec) -> Self {
        self.spec = spec;
        self
    }

    pub fn with_capacity_left(mut self, capacity_left: f64) -> Self {
        self.capacity_left = Some(capacity_left);
        self
    }

    pub fn with_trips(mut self, trips: u32) -> Self {
        self.trips = trips;
        self
    }

    pub fn departing_at(mut self, ms: u64) -> Self {
        self.departs_at = ms;
        self
    }

    /// Returns `(user, vehicle)`.
    pub fn spawn(self, world: &mut World) -> (Entity, Entity) {
        let mut vehicle = Vehicle::new(VehicleKind::Bike, self.spec);
        if let Some(left) = self.capacity_left {
            vehicle = vehicle.with_capacity_left(left);
        }
        let vehicle = world.spawn(vehicle).id();
        let user = world
            .spawn(
                User::new(vehicle, self.location, Some(self.home), self.trips)
                    .with_departure(self.departs_at),
            )
            .id();
        world
            .get_mut::<Vehicle>(vehicle)
            .expect("vehicle")
            .user = Some(user);
        (user, vehicle)
    }
}

/// A parked vehicle with no user, `capacity_left` energy remaining.
pub fn spawn_parked_vehicle(world: &mut World, capacity_left: f64) -> Entity {
    world
        .spawn(Vehicle::new(VehicleKind::Scooter, test_vehicle_spec()).with_capacity_left(capacity_left))
        .id()
}

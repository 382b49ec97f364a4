//! ChargeCompleted: the charge timer of one session fired.

use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::station::Station;
use crate::storage::LockHolder;
use crate::systems::{close_trip, request_decision};
use crate::telemetry::{ChargeRecord, SimTelemetry};
use crate::user::{User, UserConfig};
use crate::vehicle::Vehicle;

pub fn charge_completed_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    config: Option<Res<UserConfig>>,
    mut telemetry: ResMut<SimTelemetry>,
    mut stations: Query<&mut Station>,
    mut users: Query<&mut User>,
    mut vehicles: Query<&mut Vehicle>,
) {
    if event.0.kind != EventKind::ChargeCompleted {
        return;
    }
    let Some(EventSubject::Charge {
        station: station_entity,
        vehicle: vehicle_entity,
        ticket,
    }) = event.0.subject
    else {
        return;
    };
    let Ok(mut station) = stations.get_mut(station_entity) else {
        return;
    };
    let Some(task) = station.complete_charge(vehicle_entity, ticket) else {
        log::debug!("stale charge timer for {:?} (ticket {})", vehicle_entity, ticket);
        return;
    };

    let now = clock.now();
    let (energy_added, user_entity) = match vehicles.get_mut(vehicle_entity) {
        Ok(mut vehicle) => {
            let missing = vehicle.capacity_used();
            vehicle.fully_charge();
            (missing, vehicle.user)
        }
        Err(_) => (0.0, None),
    };

    let config = config.as_deref().copied().unwrap_or_default();
    let mut requested_at = 0;
    if let Some(user_entity) = user_entity {
        if let Ok(mut user) = users.get_mut(user_entity) {
            requested_at = user.arrived_at.unwrap_or(task.started_at);
            if user.is_at_station() && user.station == Some(station_entity) {
                close_trip(&mut clock, &mut telemetry, &config, user_entity, &mut user);
            }
        }
    }

    telemetry.record_charge(ChargeRecord {
        station: station_entity,
        vehicle: vehicle_entity,
        user: user_entity,
        requested_at,
        started_at: task.started_at,
        ended_at: now,
        energy_added,
        interrupted: false,
    });
    log::debug!(
        "vehicle {:?} fully charged at station {} (+{:.1})",
        vehicle_entity,
        station.id,
        energy_added
    );

    request_decision(
        &mut clock,
        station_entity,
        &mut station,
        LockHolder::SlotFreed(vehicle_entity),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Entity, Schedule, World};

    use crate::spatial::Point;
    use crate::storage::StationStorage;
    use crate::user::UserState;
    use crate::vehicle::{VehicleKind, VehicleSpec};

    fn setup() -> (World, Entity, Entity, Entity) {
        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        world.insert_resource(SimTelemetry::default());
        let station = world
            .spawn(
                Station::new(0, Point::default(), 1_000, 1, StationStorage::fifo(2))
                    .expect("station"),
            )
            .id();
        let vehicle = world
            .spawn(
                Vehicle::new(
                    VehicleKind::Bike,
                    VehicleSpec {
                        battery_capacity: 100.0,
                        energy_consumption: 1.0,
                        velocity: 10.0,
                    },
                )
                .with_capacity_left(0.0),
            )
            .id();
        let mut user = User::new(vehicle, Point::default(), Some(station), 1);
        user.begin_visit(Point::default(), 0);
        user.state = UserState::Charging;
        let user = world.spawn(user).id();
        world.entity_mut(vehicle).get_mut::<Vehicle>().expect("vehicle").user = Some(user);
        (world, station, vehicle, user)
    }

    fn fire(world: &mut World, station: Entity, vehicle: Entity, ticket: u64, at: u64) {
        world.resource_mut::<SimulationClock>().schedule_at(
            at,
            EventKind::ChargeCompleted,
            Some(EventSubject::Charge {
                station,
                vehicle,
                ticket,
            }),
        );
        let event = world
            .resource_mut::<SimulationClock>()
            .pop_next()
            .expect("event");
        world.insert_resource(CurrentEvent(event));
        let mut schedule = Schedule::default();
        schedule.add_systems(charge_completed_system);
        schedule.run(world);
    }

    #[test]
    fn completion_fully_charges_and_frees_the_slot() {
        let (mut world, station, vehicle, user) = setup();
        let task = world
            .entity_mut(station)
            .get_mut::<Station>()
            .expect("station")
            .start_charging(vehicle, 0)
            .expect("start");

        fire(&mut world, station, vehicle, task.ticket, task.completes_at);

        let v = world.entity(vehicle).get::<Vehicle>().expect("vehicle");
        assert_eq!(v.capacity_left(), 100.0);
        assert!(v.is_charged());
        assert_eq!(
            world.entity(user).get::<User>().expect("user").state,
            UserState::Finished
        );

        let s = world.entity(station).get::<Station>().expect("station");
        assert_eq!(s.free_slots(), 1);
        assert_eq!(
            s.storage().lock_holder(),
            Some(LockHolder::SlotFreed(vehicle)),
            "freed slot asks for a refill decision"
        );

        let telemetry = world.resource::<SimTelemetry>();
        assert_eq!(telemetry.charges.len(), 1);
        assert_eq!(telemetry.charges[0].energy_added, 100.0);
        assert_eq!(telemetry.charges[0].charge_duration(), 1_000);
    }

    #[test]
    fn stale_ticket_is_ignored() {
        let (mut world, station, vehicle, _) = setup();
        let task = world
            .entity_mut(station)
            .get_mut::<Station>()
            .expect("station")
            .start_charging(vehicle, 0)
            .expect("start");

        fire(&mut world, station, vehicle, task.ticket + 1, 1_000);

        let v = world.entity(vehicle).get::<Vehicle>().expect("vehicle");
        assert_eq!(v.capacity_left(), 0.0);
        let s = world.entity(station).get::<Station>().expect("station");
        assert!(s.is_charging(vehicle));
        assert!(world.resource::<SimTelemetry>().charges.is_empty());
    }
}

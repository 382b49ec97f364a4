//! UserDeparts: pick a destination, drain the battery for the distance and
//! schedule the arrival after the travel time.

use bevy_ecs::prelude::{Entity, Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::error::VehicleError;
use crate::spatial::Point;
use crate::station::Station;
use crate::telemetry::{SimTelemetry, StrandedRecord};
use crate::user::{User, UserConfig, UserState};
use crate::vehicle::Vehicle;

pub fn user_departs_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    config: Option<Res<UserConfig>>,
    mut telemetry: ResMut<SimTelemetry>,
    stations: Query<(Entity, &Station)>,
    mut users: Query<&mut User>,
    mut vehicles: Query<&mut Vehicle>,
) {
    if event.0.kind != EventKind::UserDeparts {
        return;
    }
    let Some(EventSubject::User(user_entity)) = event.0.subject else {
        return;
    };
    let Ok(mut user) = users.get_mut(user_entity) else {
        return;
    };
    if user.state != UserState::Idle {
        return;
    }

    let config = config.as_deref().copied().unwrap_or_default();
    let mut network: Vec<(Entity, Point, usize)> = stations
        .iter()
        .map(|(entity, station)| (entity, station.position, station.id))
        .collect();
    network.sort_by_key(|(_, _, id)| *id);
    let network: Vec<(Entity, Point)> = network.into_iter().map(|(e, p, _)| (e, p)).collect();

    let mut rng = config.trip_rng(user_entity, user.trips_completed);
    let Some((destination, target)) = user.pick_destination(&mut rng, &network) else {
        log::warn!("user {:?} has no other station to travel to", user_entity);
        user.state = UserState::Finished;
        return;
    };

    let Ok(mut vehicle) = vehicles.get_mut(user.vehicle) else {
        log::error!("user {:?} drives a missing vehicle {:?}", user_entity, user.vehicle);
        return;
    };

    let distance = user.location.distance(target);
    match vehicle.move_by(distance) {
        Ok(used) => {
            let travel_ms = vehicle.travel_time_ms(distance);
            user.depart_to(destination);
            clock.schedule_in(
                travel_ms,
                EventKind::UserArrives,
                Some(EventSubject::User(user_entity)),
            );
            log::debug!(
                "user {:?} departs for {:?}: {:.2} km, {:.1} energy, arrives in {} ms",
                user_entity,
                destination,
                distance,
                used,
                travel_ms
            );
        }
        Err(VehicleError::EnergyExhausted {
            required,
            available,
        }) => {
            log::info!(
                "user {:?} stranded at {}: trip needs {:.1}, battery holds {:.1}",
                user_entity,
                clock.now(),
                required,
                available
            );
            user.strand();
            telemetry.stranded.push(StrandedRecord {
                user: user_entity,
                vehicle: user.vehicle,
                at: clock.now(),
                required,
                available,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};

    use crate::clock::ONE_HOUR_MS;
    use crate::storage::StationStorage;
    use crate::vehicle::{VehicleKind, VehicleSpec};

    #[test]
    fn departure_drains_battery_and_schedules_arrival() {
        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        world.insert_resource(SimTelemetry::default());

        let from = world
            .spawn(
                Station::new(0, Point::new(0.0, 0.0), 1, 1, StationStorage::fifo(1))
                    .expect("station"),
            )
            .id();
        let to = world
            .spawn(
                Station::new(1, Point::new(3.0, 4.0), 1, 1, StationStorage::fifo(1))
                    .expect("station"),
            )
            .id();
        let vehicle = world
            .spawn(Vehicle::new(
                VehicleKind::Bike,
                VehicleSpec {
                    battery_capacity: 100.0,
                    energy_consumption: 4.0,
                    velocity: 10.0,
                },
            ))
            .id();
        let user = world
            .spawn(User::new(vehicle, Point::new(0.0, 0.0), Some(from), 1))
            .id();

        world.resource_mut::<SimulationClock>().schedule_at(
            0,
            EventKind::UserDeparts,
            Some(EventSubject::User(user)),
        );
        let event = world
            .resource_mut::<SimulationClock>()
            .pop_next()
            .expect("event");
        world.insert_resource(CurrentEvent(event));

        let mut schedule = Schedule::default();
        schedule.add_systems(user_departs_system);
        schedule.run(&mut world);

        let u = world.entity(user).get::<User>().expect("user");
        assert_eq!(u.state, UserState::Travelling);
        assert_eq!(u.station, Some(to));
        let v = world.entity(vehicle).get::<Vehicle>().expect("vehicle");
        assert_eq!(v.capacity_left(), 80.0);

        let arrival = world
            .resource_mut::<SimulationClock>()
            .pop_next()
            .expect("arrival");
        assert_eq!(arrival.kind, EventKind::UserArrives);
        assert_eq!(arrival.timestamp, ONE_HOUR_MS / 2);
    }
}

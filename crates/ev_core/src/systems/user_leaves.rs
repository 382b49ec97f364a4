//! UserLeaves: patience ran out during a station visit.

use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::station::Station;
use crate::storage::LockHolder;
use crate::systems::request_decision;
use crate::user::User;

pub fn user_leaves_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    mut stations: Query<&mut Station>,
    users: Query<&User>,
) {
    if event.0.kind != EventKind::UserLeaves {
        return;
    }
    let Some(EventSubject::Visit {
        user: user_entity,
        visit,
    }) = event.0.subject
    else {
        return;
    };
    let Ok(user) = users.get(user_entity) else {
        return;
    };
    // The visit already ended (charged, turned away, or a later visit).
    if user.visit != visit || !user.is_at_station() {
        return;
    }
    let Some(station_entity) = user.station else {
        return;
    };
    let Ok(mut station) = stations.get_mut(station_entity) else {
        return;
    };

    log::debug!(
        "user {:?} out of patience at station {} ({:?})",
        user_entity,
        station.id,
        user.state
    );
    request_decision(
        &mut clock,
        station_entity,
        &mut station,
        LockHolder::Departure(user.vehicle),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Entity, Schedule, World};

    use crate::spatial::Point;
    use crate::storage::StationStorage;
    use crate::user::UserState;

    fn fire(world: &mut World, user: Entity, visit: u32) {
        world.resource_mut::<SimulationClock>().schedule_at(
            10,
            EventKind::UserLeaves,
            Some(EventSubject::Visit { user, visit }),
        );
        let event = world
            .resource_mut::<SimulationClock>()
            .pop_next()
            .expect("event");
        world.insert_resource(CurrentEvent(event));
        let mut schedule = Schedule::default();
        schedule.add_systems(user_leaves_system);
        schedule.run(world);
    }

    #[test]
    fn waiting_user_requests_departure_decision() {
        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        let station = world
            .spawn(
                Station::new(0, Point::default(), 100, 1, StationStorage::fifo(1))
                    .expect("station"),
            )
            .id();
        let vehicle = Entity::from_raw(77);
        let mut u = User::new(vehicle, Point::default(), Some(station), 1);
        let visit = u.begin_visit(Point::default(), 0);
        u.state = UserState::Waiting;
        let user = world.spawn(u).id();

        fire(&mut world, user, visit);

        let s = world.entity(station).get::<Station>().expect("station");
        assert_eq!(s.storage().lock_holder(), Some(LockHolder::Departure(vehicle)));
        let next = world
            .resource_mut::<SimulationClock>()
            .pop_next()
            .expect("decision");
        assert_eq!(next.kind, EventKind::ChargeDecision);
    }

    #[test]
    fn stale_visit_timer_is_ignored() {
        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        let station = world
            .spawn(
                Station::new(0, Point::default(), 100, 1, StationStorage::fifo(1))
                    .expect("station"),
            )
            .id();
        let mut u = User::new(Entity::from_raw(77), Point::default(), Some(station), 2);
        let visit = u.begin_visit(Point::default(), 0);
        u.end_trip();
        let user = world.spawn(u).id();

        fire(&mut world, user, visit);

        let s = world.entity(station).get::<Station>().expect("station");
        assert!(!s.storage().is_locked());
        assert!(world.resource::<SimulationClock>().is_empty());
    }
}

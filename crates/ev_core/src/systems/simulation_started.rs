//! SimulationStarted: schedule first departures and fill stations seeded with vehicles.

use bevy_ecs::prelude::{Entity, Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::station::Station;
use crate::storage::LockHolder;
use crate::systems::request_decision;
use crate::user::{User, UserState};

pub fn simulation_started_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    users: Query<(Entity, &User)>,
    mut stations: Query<(Entity, &mut Station)>,
) {
    if event.0.kind != EventKind::SimulationStarted {
        return;
    }

    let mut departures = 0usize;
    for (entity, user) in users.iter() {
        if user.state == UserState::Idle && user.trips_remaining > 0 {
            clock.schedule_at(
                user.departs_at,
                EventKind::UserDeparts,
                Some(EventSubject::User(entity)),
            );
            departures += 1;
        }
    }

    for (entity, mut station) in stations.iter_mut() {
        if !station.storage().is_empty() {
            request_decision(&mut clock, entity, &mut station, LockHolder::Startup);
        }
    }

    log::info!(
        "simulation started: {} stations, {} departures scheduled",
        stations.iter().count(),
        departures
    );
}

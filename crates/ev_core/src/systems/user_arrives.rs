//! UserArrives: start a visit and ask the station for a charging decision.

use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::station::Station;
use crate::storage::LockHolder;
use crate::systems::{close_trip, request_decision};
use crate::telemetry::SimTelemetry;
use crate::user::{User, UserConfig, UserState};
use crate::vehicle::Vehicle;

pub fn user_arrives_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    config: Option<Res<UserConfig>>,
    mut telemetry: ResMut<SimTelemetry>,
    mut stations: Query<&mut Station>,
    mut users: Query<&mut User>,
    vehicles: Query<&Vehicle>,
) {
    if event.0.kind != EventKind::UserArrives {
        return;
    }
    let Some(EventSubject::User(user_entity)) = event.0.subject else {
        return;
    };
    let Ok(mut user) = users.get_mut(user_entity) else {
        return;
    };
    if user.state != UserState::Travelling {
        return;
    }
    let Some(station_entity) = user.station else {
        return;
    };
    let Ok(mut station) = stations.get_mut(station_entity) else {
        log::error!("user {:?} arrived at missing station {:?}", user_entity, station_entity);
        return;
    };

    let config = config.as_deref().copied().unwrap_or_default();
    let now = clock.now();
    let visit = user.begin_visit(station.position, now);
    telemetry.arrivals += 1;
    telemetry.station(station_entity).arrivals += 1;

    let charged = vehicles
        .get(user.vehicle)
        .map(|v| v.is_charged())
        .unwrap_or(true);
    if charged {
        log::debug!("user {:?} arrived at station {} with a full battery", user_entity, station.id);
        close_trip(&mut clock, &mut telemetry, &config, user_entity, &mut user);
        return;
    }

    request_decision(
        &mut clock,
        station_entity,
        &mut station,
        LockHolder::Arrival(user.vehicle),
    );
    if let Some(patience) = config.patience_ms {
        clock.schedule_in(
            patience,
            EventKind::UserLeaves,
            Some(EventSubject::Visit {
                user: user_entity,
                visit,
            }),
        );
    }
}

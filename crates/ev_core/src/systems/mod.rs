pub mod charge_completed;
pub mod charge_decision;
pub mod simulation_started;
pub mod user_arrives;
pub mod user_departs;
pub mod user_leaves;

use bevy_ecs::prelude::Entity;

use crate::clock::{EventKind, EventSubject, SimulationClock};
use crate::station::Station;
use crate::storage::{LockHolder, LockOutcome};
use crate::telemetry::SimTelemetry;
use crate::user::{User, UserConfig};

/// Ask for the station lock. The decision runs at the current instant once the
/// lock is ours; a queued request is resumed by whoever releases it.
pub(crate) fn request_decision(
    clock: &mut SimulationClock,
    station_entity: Entity,
    station: &mut Station,
    holder: LockHolder,
) {
    match station.request_lock(holder) {
        LockOutcome::Acquired => {
            clock.schedule_now(
                EventKind::ChargeDecision,
                Some(EventSubject::Station(station_entity)),
            );
        }
        LockOutcome::AlreadyHeld => {
            log::debug!(
                "station {}: {:?} already holds the lock, decision pending",
                station.id,
                holder
            );
        }
        LockOutcome::Queued => {
            log::debug!(
                "station {} busy, {:?} waits for the lock ({} queued)",
                station.id,
                holder,
                station.storage().lock_waiters()
            );
        }
    }
}

/// Close the user's current trip and schedule the next departure, if any.
pub(crate) fn close_trip(
    clock: &mut SimulationClock,
    telemetry: &mut SimTelemetry,
    config: &UserConfig,
    user_entity: Entity,
    user: &mut User,
) {
    telemetry.trips_completed += 1;
    if user.end_trip() {
        clock.schedule_in(
            config.dwell_ms,
            EventKind::UserDeparts,
            Some(EventSubject::User(user_entity)),
        );
    } else {
        log::debug!("user {:?} finished all trips at {}", user_entity, clock.now());
    }
}

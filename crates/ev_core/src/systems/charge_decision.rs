//! ChargeDecision: the lock holder of a station performs its check-then-act
//! step, then hands the lock to the next waiter.
//!
//! What the step does depends on why the lock was requested:
//! - `Arrival`: the vehicle competes for a slot, is queued, or is turned away.
//! - `SlotFreed` / `Startup`: free slots are refilled from the queue.
//! - `Departure`: the vehicle is withdrawn from the queue or unplugged with a
//!   partial charge, then free slots are refilled.

use bevy_ecs::prelude::{Entity, Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::station::{ChargeOutcome, ChargeTask, Station};
use crate::storage::LockHolder;
use crate::systems::close_trip;
use crate::telemetry::{ChargeRecord, SimTelemetry};
use crate::user::{User, UserConfig, UserState};
use crate::vehicle::Vehicle;

#[allow(clippy::too_many_arguments)]
pub fn charge_decision_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    config: Option<Res<UserConfig>>,
    mut telemetry: ResMut<SimTelemetry>,
    mut stations: Query<&mut Station>,
    mut users: Query<&mut User>,
    mut vehicles: Query<&mut Vehicle>,
) {
    if event.0.kind != EventKind::ChargeDecision {
        return;
    }
    let Some(EventSubject::Station(station_entity)) = event.0.subject else {
        return;
    };
    let Ok(mut station) = stations.get_mut(station_entity) else {
        return;
    };
    let Some(holder) = station.storage().lock_holder() else {
        log::warn!("decision at station {} without a lock holder", station.id);
        return;
    };

    let config = config.as_deref().copied().unwrap_or_default();
    let now = clock.now();

    let started = match holder {
        LockHolder::Arrival(vehicle) => match station.charge(vehicle, holder, now) {
            Ok(dispatch) => {
                let user_entity = vehicles.get(vehicle).ok().and_then(|v| v.user);
                match dispatch.outcome {
                    ChargeOutcome::Charging => {}
                    ChargeOutcome::Queued => {
                        if let Some(mut user) = user_entity.and_then(|u| users.get_mut(u).ok()) {
                            user.state = UserState::Waiting;
                        }
                        log::debug!(
                            "vehicle {:?} queued at station {} ({} waiting)",
                            vehicle,
                            station.id,
                            station.storage().count()
                        );
                    }
                    ChargeOutcome::TurnedAway => {
                        telemetry.turned_away += 1;
                        telemetry.station(station_entity).turned_away += 1;
                        log::info!("vehicle {:?} turned away from full station {}", vehicle, station.id);
                        if let Some(user_entity) = user_entity {
                            if let Ok(mut user) = users.get_mut(user_entity) {
                                close_trip(&mut clock, &mut telemetry, &config, user_entity, &mut user);
                            }
                        }
                    }
                }
                dispatch.started
            }
            Err(err) => {
                log::error!("station {}: arrival of {:?} failed: {}", station.id, vehicle, err);
                Vec::new()
            }
        },
        LockHolder::Departure(vehicle) => {
            release_vehicle(
                &mut clock,
                &mut telemetry,
                &config,
                station_entity,
                &mut station,
                vehicle,
                &mut users,
                &mut vehicles,
            );
            refill(&mut station, holder, now)
        }
        LockHolder::SlotFreed(_) | LockHolder::Startup => refill(&mut station, holder, now),
    };

    for task in started {
        begin_charge(&mut clock, station_entity, &task, &mut users, &vehicles);
    }

    let (queued, charging) = (station.storage().count(), station.charging_count());
    telemetry.station(station_entity).observe(queued, charging);

    match station.request_unlock(holder) {
        Ok(Some(next)) => {
            log::debug!("station {} lock passes to {:?}", station.id, next);
            clock.schedule_now(
                EventKind::ChargeDecision,
                Some(EventSubject::Station(station_entity)),
            );
        }
        Ok(None) => {}
        Err(err) => log::error!("station {}: unlock by {:?} failed: {}", station.id, holder, err),
    }
}

fn refill(station: &mut Station, holder: LockHolder, now: u64) -> Vec<ChargeTask> {
    station.charge_next_vehicle(holder, now).unwrap_or_else(|err| {
        log::error!("station {}: refill failed: {}", station.id, err);
        Vec::new()
    })
}

fn begin_charge(
    clock: &mut SimulationClock,
    station_entity: Entity,
    task: &ChargeTask,
    users: &mut Query<&mut User>,
    vehicles: &Query<&mut Vehicle>,
) {
    clock.schedule_at(
        task.completes_at,
        EventKind::ChargeCompleted,
        Some(EventSubject::Charge {
            station: station_entity,
            vehicle: task.vehicle,
            ticket: task.ticket,
        }),
    );
    let user_entity = vehicles.get(task.vehicle).ok().and_then(|v| v.user);
    if let Some(mut user) = user_entity.and_then(|u| users.get_mut(u).ok()) {
        user.state = UserState::Charging;
    }
    log::debug!(
        "vehicle {:?} charging until {} (ticket {})",
        task.vehicle,
        task.completes_at,
        task.ticket
    );
}

/// The vehicle's user gave up: drop it from the queue, or unplug it and credit
/// the energy delivered so far.
#[allow(clippy::too_many_arguments)]
fn release_vehicle(
    clock: &mut SimulationClock,
    telemetry: &mut SimTelemetry,
    config: &UserConfig,
    station_entity: Entity,
    station: &mut Station,
    vehicle_entity: Entity,
    users: &mut Query<&mut User>,
    vehicles: &mut Query<&mut Vehicle>,
) {
    let now = clock.now();
    let user_entity = vehicles.get(vehicle_entity).ok().and_then(|v| v.user);

    if station.storage_mut().withdraw(vehicle_entity) {
        telemetry.abandoned_waits += 1;
        telemetry.station(station_entity).abandoned += 1;
        log::info!(
            "vehicle {:?} left the queue of station {} after waiting",
            vehicle_entity,
            station.id
        );
    } else if station.is_charging(vehicle_entity) {
        let task = match station.stop_charging(vehicle_entity) {
            Ok(task) => task,
            Err(err) => {
                log::error!("station {}: stop failed: {}", station.id, err);
                return;
            }
        };
        let energy_added = vehicles
            .get_mut(vehicle_entity)
            .map(|mut v| {
                let missing = v.capacity_used();
                v.charge(missing * task.progress(now))
            })
            .unwrap_or(0.0);
        let requested_at = user_entity
            .and_then(|u| users.get(u).ok())
            .and_then(|u| u.arrived_at)
            .unwrap_or(task.started_at);
        telemetry.record_charge(ChargeRecord {
            station: station_entity,
            vehicle: vehicle_entity,
            user: user_entity,
            requested_at,
            started_at: task.started_at,
            ended_at: now,
            energy_added,
            interrupted: true,
        });
        log::info!(
            "vehicle {:?} unplugged early at station {} with {:.1} energy",
            vehicle_entity,
            station.id,
            energy_added
        );
    } else {
        // Charge already completed at this instant.
        return;
    }

    if let Some(user_entity) = user_entity {
        if let Ok(mut user) = users.get_mut(user_entity) {
            if user.is_at_station() && user.station == Some(station_entity) {
                close_trip(clock, telemetry, config, user_entity, &mut user);
            }
        }
    }
}

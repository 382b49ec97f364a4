//! Metrics extraction from simulation results.
//!
//! Service outcomes (served, turned away, abandoned, stranded), wait-time
//! statistics and station load are pulled from the telemetry of a finished
//! world.

use bevy_ecs::prelude::World;
use ev_core::scenario::ScenarioParams;
use ev_core::station::Station;
use ev_core::telemetry::SimTelemetry;
use ev_core::user::User;

/// Aggregated metrics from a single simulation run.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct SimulationResult {
    pub total_users: usize,
    pub total_stations: usize,
    /// Trips the scenario asked for (`num_users * trips_per_user`).
    pub planned_trips: usize,
    /// Trips that reached their destination, charged or not.
    pub trips_completed: usize,
    /// `trips_completed / planned_trips`.
    pub completion_rate: f64,
    /// User charge sessions that ran to a full battery.
    pub charges_completed: usize,
    /// User charge sessions cut short by impatience.
    pub charges_interrupted: usize,
    pub turned_away: usize,
    pub abandoned_waits: usize,
    pub stranded_users: usize,
    /// Share of charge requests that ended with a full battery.
    pub service_rate: f64,
    /// Average wait from arrival to plug-in, in milliseconds.
    pub avg_wait_ms: f64,
    pub median_wait_ms: f64,
    pub p90_wait_ms: f64,
    /// Average time from arrival to leaving with a charge.
    pub avg_time_at_station_ms: f64,
    pub energy_delivered: f64,
    /// Largest queue seen at any station.
    pub peak_queue: usize,
    pub events_processed: usize,
}

impl SimulationResult {
    /// Average, median and p90 of `values`.
    pub(crate) fn calculate_stats(values: &[u64]) -> (f64, f64, f64) {
        if values.is_empty() {
            return (0.0, 0.0, 0.0);
        }

        let mut sorted = values.to_vec();
        sorted.sort_unstable();

        let avg = sorted.iter().sum::<u64>() as f64 / sorted.len() as f64;
        let median = if sorted.len() % 2 == 0 {
            (sorted[sorted.len() / 2 - 1] + sorted[sorted.len() / 2]) as f64 / 2.0
        } else {
            sorted[sorted.len() / 2] as f64
        };
        // floor(0.9 * (n - 1))
        let p90_idx = ((sorted.len() - 1) as f64 * 0.9) as usize;
        let p90 = sorted[p90_idx.min(sorted.len() - 1)] as f64;

        (avg, median, p90)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Extract metrics from a completed simulation world.
///
/// Only sessions of vehicles that belong to a user count toward service and
/// wait statistics; vehicles parked at startup have no one waiting on them.
pub fn extract_metrics(
    world: &mut World,
    params: &ScenarioParams,
    events_processed: usize,
) -> SimulationResult {
    let total_users = world.query::<&User>().iter(world).count();
    let total_stations = world.query::<&Station>().iter(world).count();
    let planned_trips = params.num_users * params.trips_per_user as usize;

    let Some(telemetry) = world.get_resource::<SimTelemetry>() else {
        log::warn!("world has no telemetry, reporting empty metrics");
        return SimulationResult {
            total_users,
            total_stations,
            planned_trips,
            events_processed,
            ..SimulationResult::default()
        };
    };

    let user_charges: Vec<_> = telemetry
        .charges
        .iter()
        .filter(|c| c.user.is_some())
        .collect();
    let charges_completed = user_charges.iter().filter(|c| !c.interrupted).count();
    let charges_interrupted = user_charges.len() - charges_completed;

    let waits: Vec<u64> = user_charges.iter().map(|c| c.wait_time()).collect();
    let (avg_wait_ms, median_wait_ms, p90_wait_ms) = SimulationResult::calculate_stats(&waits);
    let stays: Vec<u64> = user_charges.iter().map(|c| c.time_at_station()).collect();
    let (avg_time_at_station_ms, _, _) = SimulationResult::calculate_stats(&stays);

    let requests = user_charges.len() + telemetry.turned_away + telemetry.abandoned_waits;

    SimulationResult {
        total_users,
        total_stations,
        planned_trips,
        trips_completed: telemetry.trips_completed,
        completion_rate: ratio(telemetry.trips_completed, planned_trips),
        charges_completed,
        charges_interrupted,
        turned_away: telemetry.turned_away,
        abandoned_waits: telemetry.abandoned_waits,
        stranded_users: telemetry.stranded.len(),
        service_rate: ratio(charges_completed, requests),
        avg_wait_ms,
        median_wait_ms,
        p90_wait_ms,
        avg_time_at_station_ms,
        energy_delivered: telemetry.energy_delivered(),
        peak_queue: telemetry.peak_queue(),
        events_processed,
    }
}

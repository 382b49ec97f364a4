//! Telemetry / KPIs: charge sessions and user outcomes for analysis.

use std::collections::HashMap;

use bevy_ecs::prelude::{Entity, Resource};

/// One charge session, recorded when it completes or is interrupted.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeRecord {
    pub station: Entity,
    pub vehicle: Entity,
    /// `None` for vehicles deployed at setup.
    pub user: Option<Entity>,
    /// When the vehicle asked for a slot (arrival, or 0 when deployed).
    pub requested_at: u64,
    pub started_at: u64,
    pub ended_at: u64,
    pub energy_added: f64,
    pub interrupted: bool,
}

impl ChargeRecord {
    /// Time spent queued before a slot was granted.
    pub fn wait_time(&self) -> u64 {
        self.started_at.saturating_sub(self.requested_at)
    }

    pub fn charge_duration(&self) -> u64 {
        self.ended_at.saturating_sub(self.started_at)
    }

    /// Arrival to unplug.
    pub fn time_at_station(&self) -> u64 {
        self.ended_at.saturating_sub(self.requested_at)
    }
}

/// A user whose battery could not cover the next trip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrandedRecord {
    pub user: Entity,
    pub vehicle: Entity,
    pub at: u64,
    pub required: f64,
    pub available: f64,
}

/// Per-station counters and high-water marks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StationStats {
    pub arrivals: usize,
    pub charges_completed: usize,
    pub charges_interrupted: usize,
    pub turned_away: usize,
    pub abandoned: usize,
    pub peak_queue: usize,
    pub peak_charging: usize,
}

impl StationStats {
    pub fn observe(&mut self, queued: usize, charging: usize) {
        self.peak_queue = self.peak_queue.max(queued);
        self.peak_charging = self.peak_charging.max(charging);
    }
}

/// Collects simulation telemetry. Insert as a resource to record outcomes.
#[derive(Debug, Default, Resource)]
pub struct SimTelemetry {
    pub charges: Vec<ChargeRecord>,
    pub stranded: Vec<StrandedRecord>,
    pub trips_completed: usize,
    /// Arrivals that found a full queue and no free slot.
    pub turned_away: usize,
    /// Users who left the queue before a slot was granted.
    pub abandoned_waits: usize,
    pub arrivals: usize,
    pub stations: HashMap<Entity, StationStats>,
}

impl SimTelemetry {
    pub fn station(&mut self, station: Entity) -> &mut StationStats {
        self.stations.entry(station).or_default()
    }

    pub fn record_charge(&mut self, record: ChargeRecord) {
        let stats = self.station(record.station);
        if record.interrupted {
            stats.charges_interrupted += 1;
        } else {
            stats.charges_completed += 1;
        }
        self.charges.push(record);
    }

    pub fn completed_charges(&self) -> impl Iterator<Item = &ChargeRecord> {
        self.charges.iter().filter(|r| !r.interrupted)
    }

    /// Wait times of every session that got a slot.
    pub fn wait_times(&self) -> Vec<u64> {
        self.charges.iter().map(ChargeRecord::wait_time).collect()
    }

    pub fn energy_delivered(&self) -> f64 {
        self.charges.iter().map(|r| r.energy_added).sum()
    }

    pub fn peak_queue(&self) -> usize {
        self.stations.values().map(|s| s.peak_queue).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(station: u32, requested_at: u64, started_at: u64, interrupted: bool) -> ChargeRecord {
        ChargeRecord {
            station: Entity::from_raw(station),
            vehicle: Entity::from_raw(50),
            user: None,
            requested_at,
            started_at,
            ended_at: started_at + 100,
            energy_added: 10.0,
            interrupted,
        }
    }

    #[test]
    fn charge_record_durations() {
        let r = record(1, 10, 40, false);
        assert_eq!(r.wait_time(), 30);
        assert_eq!(r.charge_duration(), 100);
        assert_eq!(r.time_at_station(), 130);
    }

    #[test]
    fn records_split_completed_and_interrupted_per_station() {
        let mut telemetry = SimTelemetry::default();
        telemetry.record_charge(record(1, 0, 0, false));
        telemetry.record_charge(record(1, 0, 5, true));
        telemetry.record_charge(record(2, 0, 7, false));

        assert_eq!(telemetry.completed_charges().count(), 2);
        assert_eq!(telemetry.wait_times(), vec![0, 5, 7]);
        assert_eq!(telemetry.energy_delivered(), 30.0);

        let s1 = telemetry.stations[&Entity::from_raw(1)];
        assert_eq!(s1.charges_completed, 1);
        assert_eq!(s1.charges_interrupted, 1);
    }

    #[test]
    fn station_stats_track_peaks() {
        let mut telemetry = SimTelemetry::default();
        let station = Entity::from_raw(3);
        telemetry.station(station).observe(2, 1);
        telemetry.station(station).observe(1, 3);
        assert_eq!(telemetry.stations[&station].peak_queue, 2);
        assert_eq!(telemetry.stations[&station].peak_charging, 3);
        assert_eq!(telemetry.peak_queue(), 2);
    }
}

//! Users: each rides one vehicle between stations.

use bevy_ecs::prelude::{Component, Entity, Resource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clock::ONE_MIN_MS;
use crate::spatial::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserState {
    /// Parked at a location, next departure scheduled.
    Idle,
    Travelling,
    /// At a station, waiting for the scheduling decision on its arrival.
    Requesting,
    /// Queued in station storage.
    Waiting,
    Charging,
    /// No trips left.
    Finished,
    /// Battery could not cover the last trip. Terminal.
    Stranded,
}

#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct User {
    pub state: UserState,
    pub vehicle: Entity,
    /// Where the user currently is (or last departed from).
    pub location: Point,
    /// Current station while visiting, destination while travelling.
    pub station: Option<Entity>,
    pub trips_remaining: u32,
    pub trips_completed: u32,
    /// Counter of station visits; timers tagged with an older value are stale.
    pub visit: u32,
    /// Arrival time of the current visit.
    pub arrived_at: Option<u64>,
    /// Time of the first departure.
    pub departs_at: u64,
}

impl User {
    pub fn new(vehicle: Entity, location: Point, station: Option<Entity>, trips: u32) -> Self {
        Self {
            state: UserState::Idle,
            vehicle,
            location,
            station,
            trips_remaining: trips,
            trips_completed: 0,
            visit: 0,
            arrived_at: None,
            departs_at: 0,
        }
    }

    pub fn with_departure(mut self, departs_at: u64) -> Self {
        self.departs_at = departs_at;
        self
    }

    pub fn is_at_station(&self) -> bool {
        matches!(
            self.state,
            UserState::Requesting | UserState::Waiting | UserState::Charging
        )
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, UserState::Finished | UserState::Stranded)
    }

    /// Pick a station other than the current one. `None` when there is nowhere
    /// else to go.
    pub fn pick_destination<R: Rng>(
        &self,
        rng: &mut R,
        stations: &[(Entity, Point)],
    ) -> Option<(Entity, Point)> {
        let candidates: Vec<_> = stations
            .iter()
            .filter(|(entity, _)| Some(*entity) != self.station)
            .copied()
            .collect();
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[rng.gen_range(0..candidates.len())])
    }

    pub fn depart_to(&mut self, station: Entity) {
        self.state = UserState::Travelling;
        self.station = Some(station);
        self.arrived_at = None;
    }

    /// Start a stay at the destination station. Returns the visit tag.
    pub fn begin_visit(&mut self, location: Point, now: u64) -> u32 {
        self.visit = self.visit.wrapping_add(1);
        self.location = location;
        self.arrived_at = Some(now);
        self.state = UserState::Requesting;
        self.visit
    }

    /// Close the current trip. Returns `true` when another trip follows.
    pub fn end_trip(&mut self) -> bool {
        self.visit = self.visit.wrapping_add(1);
        self.trips_completed += 1;
        self.trips_remaining = self.trips_remaining.saturating_sub(1);
        if self.trips_remaining > 0 {
            self.state = UserState::Idle;
            true
        } else {
            self.state = UserState::Finished;
            false
        }
    }

    pub fn strand(&mut self) {
        self.visit = self.visit.wrapping_add(1);
        self.state = UserState::Stranded;
        self.trips_remaining = 0;
    }
}

/// Behavioural knobs shared by all users.
#[derive(Debug, Clone, Copy, Resource)]
pub struct UserConfig {
    pub seed: u64,
    /// Pause between the end of one trip and the next departure.
    pub dwell_ms: u64,
    /// Longest a user stays at a station waiting or charging. `None` waits forever.
    pub patience_ms: Option<u64>,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            dwell_ms: 10 * ONE_MIN_MS,
            patience_ms: None,
        }
    }
}

impl UserConfig {
    /// Deterministic per-trip RNG.
    pub fn trip_rng(&self, user: Entity, trip: u32) -> StdRng {
        let seed = self
            .seed
            .wrapping_add((user.index() as u64) << 20)
            .wrapping_add(trip as u64);
        StdRng::seed_from_u64(seed)
    }
}

//! Discrete-event clock: a min-heap of timestamped events.
//!
//! Events at the same timestamp pop in the order they were scheduled. Systems
//! never suspend; a "wait until T" is a `schedule_at(T, ..)` and a "wait for
//! E" is an event some other system schedules when E happens.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy_ecs::prelude::{Entity, Resource};

pub const ONE_SEC_MS: u64 = 1_000;
pub const ONE_MIN_MS: u64 = 60 * ONE_SEC_MS;
pub const ONE_HOUR_MS: u64 = 60 * ONE_MIN_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    SimulationStarted,
    UserDeparts,
    UserArrives,
    ChargeDecision,
    ChargeCompleted,
    UserLeaves,
}

/// What an event is about. Carried alongside the kind so systems can look up
/// the entities they act on without scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSubject {
    User(Entity),
    Station(Entity),
    /// One stay of a user at a station; stale once `visit` moves on.
    Visit { user: Entity, visit: u32 },
    /// One charge session; stale once the station issues a new ticket.
    Charge {
        station: Entity,
        vehicle: Entity,
        ticket: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub timestamp: u64,
    /// Insertion sequence, breaks ties between same-instant events.
    pub seq: u64,
    pub kind: EventKind,
    pub subject: Option<EventSubject>,
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap a min-heap by (timestamp, seq).
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The event currently being processed; inserted by the runner before each
/// schedule run.
#[derive(Debug, Clone, Copy, Resource)]
pub struct CurrentEvent(pub Event);

#[derive(Debug, Default, Resource)]
pub struct SimulationClock {
    now: u64,
    next_seq: u64,
    events: BinaryHeap<Event>,
}

impl SimulationClock {
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn schedule_at(&mut self, timestamp: u64, kind: EventKind, subject: Option<EventSubject>) {
        debug_assert!(
            timestamp >= self.now,
            "event timestamp must be >= current time"
        );
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(Event {
            timestamp: timestamp.max(self.now),
            seq,
            kind,
            subject,
        });
    }

    pub fn schedule_in(&mut self, delay_ms: u64, kind: EventKind, subject: Option<EventSubject>) {
        self.schedule_at(self.now.saturating_add(delay_ms), kind, subject);
    }

    pub fn schedule_in_secs(&mut self, secs: u64, kind: EventKind, subject: Option<EventSubject>) {
        self.schedule_in(secs * ONE_SEC_MS, kind, subject);
    }

    /// Resume at the current instant, after everything already queued for it.
    pub fn schedule_now(&mut self, kind: EventKind, subject: Option<EventSubject>) {
        self.schedule_at(self.now, kind, subject);
    }

    pub fn pop_next(&mut self) -> Option<Event> {
        let event = self.events.pop()?;
        self.now = event.timestamp;
        Some(event)
    }

    pub fn next_event_time(&self) -> Option<u64> {
        self.events.peek().map(|e| e.timestamp)
    }

    pub fn pending(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_pops_events_in_time_order() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(10, EventKind::UserArrives, None);
        clock.schedule_at(5, EventKind::UserDeparts, None);
        clock.schedule_at(20, EventKind::ChargeCompleted, None);

        let first = clock.pop_next().expect("first event");
        assert_eq!(first.timestamp, 5);
        assert_eq!(clock.now(), 5);

        let second = clock.pop_next().expect("second event");
        assert_eq!(second.timestamp, 10);
        assert_eq!(clock.now(), 10);

        let third = clock.pop_next().expect("third event");
        assert_eq!(third.timestamp, 20);
        assert_eq!(clock.now(), 20);

        assert!(clock.pop_next().is_none());
        assert!(clock.is_empty());
    }

    #[test]
    fn same_instant_events_keep_scheduling_order() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(7, EventKind::UserLeaves, None);
        clock.schedule_at(7, EventKind::ChargeCompleted, None);
        clock.schedule_at(7, EventKind::UserArrives, None);

        let kinds: Vec<_> = std::iter::from_fn(|| clock.pop_next())
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::UserLeaves,
                EventKind::ChargeCompleted,
                EventKind::UserArrives
            ]
        );
    }

    #[test]
    fn schedule_now_runs_after_already_queued_same_instant_events() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(3, EventKind::UserArrives, None);
        clock.schedule_at(3, EventKind::UserArrives, None);
        let first = clock.pop_next().expect("first");
        assert_eq!(first.timestamp, 3);

        clock.schedule_now(EventKind::ChargeDecision, None);
        assert_eq!(clock.next_event_time(), Some(3));
        assert_eq!(clock.pop_next().map(|e| e.kind), Some(EventKind::UserArrives));
        assert_eq!(
            clock.pop_next().map(|e| e.kind),
            Some(EventKind::ChargeDecision)
        );
    }

    #[test]
    fn schedule_in_is_relative_to_now() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(1_000, EventKind::UserDeparts, None);
        clock.pop_next();
        clock.schedule_in_secs(2, EventKind::UserArrives, None);
        assert_eq!(clock.pending(), 1);
        let e = clock.pop_next().expect("event");
        assert_eq!(e.timestamp, 3 * ONE_SEC_MS);
    }
}

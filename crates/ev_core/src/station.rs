//! Charging station: bounded concurrent charging on top of a [`StationStorage`].
//!
//! Every method that pops from the queue requires the caller to hold the
//! storage lock, so a check-then-pop sequence can never interleave with
//! another decision at the same instant.

use std::collections::HashMap;

use bevy_ecs::prelude::{Component, Entity};

use crate::error::StationError;
use crate::spatial::Point;
use crate::storage::{LockHolder, LockOutcome, StationStorage};

/// One in-progress charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeTask {
    pub vehicle: Entity,
    /// Distinguishes this session from earlier ones of the same vehicle.
    pub ticket: u64,
    pub started_at: u64,
    pub completes_at: u64,
}

impl ChargeTask {
    /// Fraction of the session elapsed at `now`, in `[0, 1]`.
    pub fn progress(&self, now: u64) -> f64 {
        let total = self.completes_at.saturating_sub(self.started_at);
        if total == 0 {
            return 1.0;
        }
        (now.saturating_sub(self.started_at) as f64 / total as f64).min(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeOutcome {
    Charging,
    Queued,
    /// No free slot and the queue is full.
    TurnedAway,
}

/// Result of [`Station::charge`]: what happened to the arriving vehicle plus
/// every charge started by the decision (the arrival's own included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeDispatch {
    pub outcome: ChargeOutcome,
    pub started: Vec<ChargeTask>,
}

#[derive(Debug, Clone, Component)]
pub struct Station {
    pub id: usize,
    pub position: Point,
    charging_time_ms: u64,
    max_concurrent_charges: usize,
    charging_vehicles: HashMap<Entity, ChargeTask>,
    storage: StationStorage,
    next_ticket: u64,
}

impl From<&Station> for Point {
    fn from(station: &Station) -> Self {
        station.position
    }
}

impl Station {
    pub fn new(
        id: usize,
        position: Point,
        charging_time_ms: u64,
        max_concurrent_charges: usize,
        storage: StationStorage,
    ) -> Result<Self, StationError> {
        if max_concurrent_charges == 0 {
            return Err(StationError::NoChargingSlots);
        }
        Ok(Self {
            id,
            position,
            charging_time_ms,
            max_concurrent_charges,
            charging_vehicles: HashMap::new(),
            storage,
            next_ticket: 0,
        })
    }

    pub fn charging_time_ms(&self) -> u64 {
        self.charging_time_ms
    }

    pub fn max_concurrent_charges(&self) -> usize {
        self.max_concurrent_charges
    }

    pub fn charging_count(&self) -> usize {
        self.charging_vehicles.len()
    }

    pub fn free_slots(&self) -> usize {
        self.max_concurrent_charges
            .saturating_sub(self.charging_vehicles.len())
    }

    pub fn is_charging(&self, vehicle: Entity) -> bool {
        self.charging_vehicles.contains_key(&vehicle)
    }

    pub fn charge_task(&self, vehicle: Entity) -> Option<&ChargeTask> {
        self.charging_vehicles.get(&vehicle)
    }

    pub fn charging_vehicles(&self) -> impl Iterator<Item = &ChargeTask> {
        self.charging_vehicles.values()
    }

    pub fn storage(&self) -> &StationStorage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut StationStorage {
        &mut self.storage
    }

    /// Euclidean distance to another station or a point.
    pub fn distance(&self, other: impl Into<Point>) -> f64 {
        self.position.distance(other.into())
    }

    pub fn request_lock(&mut self, holder: LockHolder) -> LockOutcome {
        self.storage.lock(holder)
    }

    /// Release the lock; the returned holder now owns it and must be resumed.
    pub fn request_unlock(&mut self, holder: LockHolder) -> Result<Option<LockHolder>, StationError> {
        self.storage.unlock(holder)
    }

    fn ensure_locked(&self, holder: LockHolder) -> Result<(), StationError> {
        if self.storage.is_locked_by(holder) {
            Ok(())
        } else {
            Err(StationError::LockNotHeld)
        }
    }

    /// Entry point for an arriving vehicle. The vehicle competes with the
    /// queue under the storage policy; with nobody waiting and a free slot it
    /// starts at once. When the queue is full it can only charge if the
    /// policy ranks it ahead of everyone waiting, otherwise it is turned away.
    pub fn charge(
        &mut self,
        vehicle: Entity,
        holder: LockHolder,
        now: u64,
    ) -> Result<ChargeDispatch, StationError> {
        self.ensure_locked(holder)?;
        if self.is_charging(vehicle) {
            return Err(StationError::AlreadyCharging(vehicle));
        }
        if self.storage.contains(vehicle) {
            return Err(StationError::AlreadyQueued(vehicle));
        }

        let mut started = Vec::new();
        // A full queue next to a free slot means a backfill is pending. The
        // arrival cannot join the queue, so it competes with it directly.
        if self.storage.is_full() && self.free_slots() > 0 {
            if self.storage.serves_arrival_first(vehicle) {
                started.push(self.start_charging(vehicle, now)?);
                started.extend(self.charge_next_vehicle(holder, now)?);
                return Ok(ChargeDispatch {
                    outcome: ChargeOutcome::Charging,
                    started,
                });
            }
            started.extend(self.charge_next_vehicle(holder, now)?);
        }

        if self.storage.is_empty() && self.free_slots() > 0 {
            started.push(self.start_charging(vehicle, now)?);
            return Ok(ChargeDispatch {
                outcome: ChargeOutcome::Charging,
                started,
            });
        }

        if self.storage.is_full() {
            return Ok(ChargeDispatch {
                outcome: ChargeOutcome::TurnedAway,
                started,
            });
        }

        self.storage.add_vehicle(vehicle)?;
        started.extend(self.charge_next_vehicle(holder, now)?);
        let outcome = if self.is_charging(vehicle) {
            ChargeOutcome::Charging
        } else {
            ChargeOutcome::Queued
        };
        Ok(ChargeDispatch { outcome, started })
    }

    /// Fill every free slot from the queue, in policy order.
    pub fn charge_next_vehicle(
        &mut self,
        holder: LockHolder,
        now: u64,
    ) -> Result<Vec<ChargeTask>, StationError> {
        self.ensure_locked(holder)?;
        let mut started = Vec::new();
        while self.storage.need_reschedule(self.free_slots()) {
            let Some(vehicle) = self.storage.pop_vehicle() else {
                break;
            };
            started.push(self.start_charging(vehicle, now)?);
        }
        Ok(started)
    }

    /// Plug `vehicle` into a free slot. The caller schedules the completion
    /// at `completes_at`.
    pub fn start_charging(&mut self, vehicle: Entity, now: u64) -> Result<ChargeTask, StationError> {
        if self.is_charging(vehicle) {
            return Err(StationError::AlreadyCharging(vehicle));
        }
        if self.free_slots() == 0 {
            return Err(StationError::NoFreeSlot(vehicle));
        }
        self.next_ticket += 1;
        let task = ChargeTask {
            vehicle,
            ticket: self.next_ticket,
            started_at: now,
            completes_at: now.saturating_add(self.charging_time_ms),
        };
        self.charging_vehicles.insert(vehicle, task);
        Ok(task)
    }

    /// Natural end of a session. Returns `None` for a stale ticket (the
    /// session was stopped or replaced), leaving the station untouched.
    pub fn complete_charge(&mut self, vehicle: Entity, ticket: u64) -> Option<ChargeTask> {
        match self.charging_vehicles.get(&vehicle) {
            Some(task) if task.ticket == ticket => {
                let task = self.charging_vehicles.remove(&vehicle)?;
                self.storage.charged(vehicle);
                Some(task)
            }
            _ => None,
        }
    }

    /// Forced interruption. Frees the slot and returns the interrupted task so
    /// the caller can credit the partial charge.
    pub fn stop_charging(&mut self, vehicle: Entity) -> Result<ChargeTask, StationError> {
        let task = self
            .charging_vehicles
            .remove(&vehicle)
            .ok_or(StationError::NotCharging(vehicle))?;
        self.storage.charged(vehicle);
        Ok(task)
    }
}

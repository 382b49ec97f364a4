//! Vehicles and their per-kind battery constants.
//!
//! Per-kind constants live in the [`VehicleSpecs`] lookup table, populated from
//! defaults and optionally overridden from a JSON file:
//!
//! ```json
//! { "Bike": { "BATTERY_CAPACITY": 500.0, "VELOCITY": 18.0 },
//!   "Scooter": { "ENERGY_CONSUMPTION": 15.0 } }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use bevy_ecs::prelude::{Component, Entity, Resource};
use serde::{Deserialize, Serialize};

use crate::clock::{ONE_HOUR_MS, ONE_SEC_MS};
use crate::error::{ConfigError, Result, VehicleError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleKind {
    Bike,
    Scooter,
}

impl VehicleKind {
    pub const ALL: [VehicleKind; 2] = [VehicleKind::Bike, VehicleKind::Scooter];
}

/// Battery and movement constants shared by every vehicle of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleSpec {
    /// Energy units (Wh) in a full battery.
    #[serde(rename = "BATTERY_CAPACITY")]
    pub battery_capacity: f64,
    /// Energy units per km.
    #[serde(rename = "ENERGY_CONSUMPTION")]
    pub energy_consumption: f64,
    /// km/h.
    #[serde(rename = "VELOCITY")]
    pub velocity: f64,
}

impl VehicleSpec {
    pub fn default_for(kind: VehicleKind) -> Self {
        match kind {
            VehicleKind::Bike => Self {
                battery_capacity: 500.0,
                energy_consumption: 10.0,
                velocity: 15.0,
            },
            VehicleKind::Scooter => Self {
                battery_capacity: 400.0,
                energy_consumption: 12.0,
                velocity: 20.0,
            },
        }
    }

    fn validate(&self, kind: VehicleKind) -> Result<()> {
        let fields = [
            ("BATTERY_CAPACITY", self.battery_capacity),
            ("ENERGY_CONSUMPTION", self.energy_consumption),
            ("VELOCITY", self.velocity),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{kind:?}.{name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct SpecOverride {
    #[serde(rename = "BATTERY_CAPACITY")]
    battery_capacity: Option<f64>,
    #[serde(rename = "ENERGY_CONSUMPTION")]
    energy_consumption: Option<f64>,
    #[serde(rename = "VELOCITY")]
    velocity: Option<f64>,
}

/// Lookup table of [`VehicleSpec`] keyed by kind.
#[derive(Debug, Clone, PartialEq, Resource)]
pub struct VehicleSpecs(HashMap<VehicleKind, VehicleSpec>);

impl Default for VehicleSpecs {
    fn default() -> Self {
        Self(
            VehicleKind::ALL
                .into_iter()
                .map(|kind| (kind, VehicleSpec::default_for(kind)))
                .collect(),
        )
    }
}

impl VehicleSpecs {
    pub fn get(&self, kind: VehicleKind) -> VehicleSpec {
        self.0
            .get(&kind)
            .copied()
            .unwrap_or_else(|| VehicleSpec::default_for(kind))
    }

    pub fn set(&mut self, kind: VehicleKind, spec: VehicleSpec) {
        self.0.insert(kind, spec);
    }

    /// Defaults overridden by the JSON file at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut specs = Self::default();
        specs.load_config(path)?;
        Ok(specs)
    }

    /// Override constants from a JSON file. Keys that are absent keep their
    /// current value. Fails with [`ConfigError::NotFound`] when `path` is not a
    /// readable file; on any error the table is left untouched.
    pub fn load_config(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)?;
        let overrides: HashMap<VehicleKind, SpecOverride> = serde_json::from_str(&raw)?;

        let mut updated = self.0.clone();
        for (kind, o) in overrides {
            let mut spec = self.get(kind);
            if let Some(v) = o.battery_capacity {
                spec.battery_capacity = v;
            }
            if let Some(v) = o.energy_consumption {
                spec.energy_consumption = v;
            }
            if let Some(v) = o.velocity {
                spec.velocity = v;
            }
            spec.validate(kind)?;
            updated.insert(kind, spec);
        }
        self.0 = updated;
        log::debug!("loaded vehicle config from {}", path.display());
        Ok(())
    }
}

/// A battery vehicle. `capacity_left` stays within `[0, max_capacity]`.
#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct Vehicle {
    pub kind: VehicleKind,
    /// User currently riding this vehicle, if any.
    pub user: Option<Entity>,
    max_capacity: f64,
    capacity_left: f64,
    energy_consumption: f64,
    velocity: f64,
}

impl Vehicle {
    /// A fully charged vehicle.
    pub fn new(kind: VehicleKind, spec: VehicleSpec) -> Self {
        Self {
            kind,
            user: None,
            max_capacity: spec.battery_capacity,
            capacity_left: spec.battery_capacity,
            energy_consumption: spec.energy_consumption,
            velocity: spec.velocity,
        }
    }

    pub fn with_capacity_left(mut self, capacity_left: f64) -> Self {
        self.capacity_left = capacity_left.clamp(0.0, self.max_capacity);
        self
    }

    pub fn with_user(mut self, user: Entity) -> Self {
        self.user = Some(user);
        self
    }

    pub fn capacity(&self) -> f64 {
        self.max_capacity
    }

    pub fn capacity_left(&self) -> f64 {
        self.capacity_left
    }

    pub fn capacity_used(&self) -> f64 {
        self.max_capacity - self.capacity_left
    }

    pub fn energy_consumption(&self) -> f64 {
        self.energy_consumption
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// State of charge in `[0, 1]`.
    pub fn battery_fraction(&self) -> f64 {
        self.capacity_left / self.max_capacity
    }

    pub fn is_charged(&self) -> bool {
        self.capacity_left >= self.max_capacity
    }

    pub fn fully_charge(&mut self) {
        self.capacity_left = self.max_capacity;
    }

    /// Add `amount` energy, clamped to the battery size. Returns what was added.
    pub fn charge(&mut self, amount: f64) -> f64 {
        let before = self.capacity_left;
        self.capacity_left = (self.capacity_left + amount.max(0.0)).min(self.max_capacity);
        self.capacity_left - before
    }

    pub fn energy_for(&self, distance_km: f64) -> f64 {
        distance_km * self.energy_consumption
    }

    /// Distance the remaining charge covers.
    pub fn range_km(&self) -> f64 {
        self.capacity_left / self.energy_consumption
    }

    /// Drive `distance_km`, draining the battery. On exhaustion the battery is
    /// left untouched and the caller decides what happens to the trip.
    pub fn move_by(&mut self, distance_km: f64) -> std::result::Result<f64, VehicleError> {
        let required = self.energy_for(distance_km);
        if required > self.capacity_left {
            return Err(VehicleError::EnergyExhausted {
                required,
                available: self.capacity_left,
            });
        }
        self.capacity_left -= required;
        Ok(required)
    }

    pub fn travel_time_ms(&self, distance_km: f64) -> u64 {
        if distance_km <= 0.0 {
            return ONE_SEC_MS;
        }
        let ms = (distance_km / self.velocity * ONE_HOUR_MS as f64).round() as u64;
        ms.max(ONE_SEC_MS)
    }
}

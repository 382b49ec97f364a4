use std::path::PathBuf;

use bevy_ecs::prelude::Entity;
use thiserror::Error;

/// Failures while loading vehicle or scenario configuration. Fatal to setup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Configuration file could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Caller-contract violations on a station or its storage. A correct run never
/// produces one; systems log them as errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StationError {
    #[error("storage is full ({capacity} vehicles), cannot add {vehicle:?}")]
    CapacityViolation { vehicle: Entity, capacity: usize },

    #[error("vehicle {0:?} is already waiting at this station")]
    AlreadyQueued(Entity),

    #[error("vehicle {0:?} is already charging")]
    AlreadyCharging(Entity),

    #[error("no free charging slot for vehicle {0:?}")]
    NoFreeSlot(Entity),

    #[error("vehicle {0:?} is not charging at this station")]
    NotCharging(Entity),

    #[error("scheduling lock is not held by the caller")]
    LockNotHeld,

    #[error("a station needs at least one charging slot")]
    NoChargingSlots,
}

/// Expected simulation outcome: a move that would drain the battery below zero.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum VehicleError {
    #[error("insufficient energy: move needs {required:.2}, {available:.2} left")]
    EnergyExhausted { required: f64, available: f64 },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

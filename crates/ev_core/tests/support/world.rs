#![allow(dead_code)]

use bevy_ecs::prelude::World;
use ev_core::clock::{SimulationClock, ONE_MIN_MS};
use ev_core::profiling::EventMetrics;
use ev_core::scenario::SimulationEndTimeMs;
use ev_core::telemetry::SimTelemetry;
use ev_core::user::UserConfig;
use ev_core::vehicle::VehicleSpecs;

/// Builder configuration for reproducible test worlds.
#[derive(Clone, Debug)]
pub struct TestWorldConfig {
    pub seed: u64,
    pub dwell_ms: u64,
    pub patience_ms: Option<u64>,
    pub end_time_ms: Option<u64>,
}

impl Default for TestWorldConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            dwell_ms: ONE_MIN_MS,
            patience_ms: None,
            end_time_ms: None,
        }
    }
}

/// Helper that populates the ECS world with all shared resources used in integration tests.
#[derive(Debug, Default)]
pub struct TestWorldBuilder {
    config: TestWorldConfig,
}

impl TestWorldBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the RNG seed used for destination picks.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn with_dwell_ms(mut self, dwell_ms: u64) -> Self {
        self.config.dwell_ms = dwell_ms;
        self
    }

    pub fn with_patience_ms(mut self, patience_ms: u64) -> Self {
        self.config.patience_ms = Some(patience_ms);
        self
    }

    pub fn with_end_time_ms(mut self, end_ms: u64) -> Self {
        self.config.end_time_ms = Some(end_ms);
        self
    }

    /// Build the ECS world with the configured resources.
    pub fn build(self) -> World {
        let TestWorldConfig {
            seed,
            dwell_ms,
            patience_ms,
            end_time_ms,
        } = self.config;

        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        world.insert_resource(SimTelemetry::default());
        world.insert_resource(EventMetrics::default());
        world.insert_resource(VehicleSpecs::default());
        world.insert_resource(UserConfig {
            seed,
            dwell_ms,
            patience_ms,
        });
        if let Some(end_ms) = end_time_ms {
            world.insert_resource(SimulationEndTimeMs(end_ms));
        }
        world
    }
}

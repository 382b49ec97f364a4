//! One-call entry point: build a scenario and run it to completion.

use bevy_ecs::prelude::World;

use crate::error::Result;
use crate::profiling::EventMetrics;
use crate::runner::{initialize_simulation, run_until_empty, simulation_schedule};
use crate::scenario::{build_scenario, ScenarioEntities, ScenarioParams};
use crate::vehicle::VehicleSpecs;

/// Upper bound on processed events for [run_scenario].
pub const DEFAULT_MAX_STEPS: usize = 10_000_000;

/// A finished run. Telemetry and final entity state live in `world`.
pub struct SimulationRun {
    pub world: World,
    pub entities: ScenarioEntities,
    pub steps: usize,
}

/// Build the scenario described by `params` and drain its event queue (or
/// stop at the configured end time).
pub fn run_scenario(params: ScenarioParams, specs: Option<VehicleSpecs>) -> Result<SimulationRun> {
    let mut world = World::new();
    if let Some(specs) = specs {
        world.insert_resource(specs);
    }
    let entities = build_scenario(&mut world, params)?;
    initialize_simulation(&mut world);

    let mut schedule = simulation_schedule();
    let steps = run_until_empty(&mut world, &mut schedule, DEFAULT_MAX_STEPS);
    if steps == DEFAULT_MAX_STEPS {
        log::warn!("run stopped after {steps} events with work still queued");
    }
    if let Some(metrics) = world.get_resource::<EventMetrics>() {
        metrics.log_summary();
    }
    Ok(SimulationRun {
        world,
        entities,
        steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimulationClock;
    use crate::telemetry::SimTelemetry;
    use crate::user::User;

    #[test]
    fn run_scenario_drains_the_queue() {
        let params = ScenarioParams::default().with_seed(3).with_users(10, 2);
        let run = run_scenario(params, None).expect("run");
        assert!(run.steps > 0);
        assert!(run.world.resource::<SimulationClock>().is_empty());

        let telemetry = run.world.resource::<SimTelemetry>();
        let done = run
            .entities
            .users
            .iter()
            .filter(|&&u| run.world.get::<User>(u).map(|u| u.is_done()).unwrap_or(false))
            .count();
        assert_eq!(done, 10, "every user either finishes or is stranded");
        // Default grid trips are a few km; no battery runs dry.
        assert!(telemetry.stranded.is_empty());
        assert_eq!(telemetry.trips_completed, 20);
    }
}

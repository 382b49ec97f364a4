//! Scenario setup: place stations, park vehicles and spawn users.
//!
//! Parameters come from code via the `with_*` builders or from a JSON file.

mod build;
mod params;

pub use build::{build_scenario, ScenarioEntities};
pub use params::{ScenarioParams, SimulationEndTimeMs};

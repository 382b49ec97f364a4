//! Parallel simulation execution using rayon.

use std::error::Error;

use bevy_ecs::prelude::World;
use ev_core::error::Result as ConfigResult;
use ev_core::runner::{initialize_simulation, run_until_empty, simulation_schedule};
use ev_core::scenario::build_scenario;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::metrics::{extract_metrics, SimulationResult};
use crate::parameters::ParameterSet;

/// Upper bound on processed events per run.
const MAX_STEPS: usize = 2_000_000;

pub type SweepResult<T> = std::result::Result<T, Box<dyn Error + Send + Sync>>;

/// Run a single simulation with the given parameter set.
///
/// Creates a new world, builds the scenario, runs it to completion (or its
/// end time) and extracts metrics.
pub fn run_single_simulation(param_set: &ParameterSet) -> ConfigResult<SimulationResult> {
    let mut world = World::new();
    let params = param_set.scenario_params();

    build_scenario(&mut world, params.clone())?;
    initialize_simulation(&mut world);

    let mut schedule = simulation_schedule();
    let steps = run_until_empty(&mut world, &mut schedule, MAX_STEPS);
    if steps == MAX_STEPS {
        log::warn!(
            "{} run {} hit the step limit",
            param_set.experiment_id,
            param_set.run_id
        );
    }

    Ok(extract_metrics(&mut world, &params, steps))
}

/// Run multiple simulations in parallel with a progress bar.
///
/// Results come back in the order of `parameter_sets`.
pub fn run_parallel_experiments(
    parameter_sets: Vec<ParameterSet>,
    num_threads: Option<usize>,
) -> SweepResult<Vec<SimulationResult>> {
    run_parallel_experiments_with_progress(parameter_sets, num_threads, true)
}

/// Run multiple simulations in parallel with an optional progress bar.
///
/// Each simulation runs independently with no shared state. The first
/// invalid parameter set aborts the sweep.
pub fn run_parallel_experiments_with_progress(
    parameter_sets: Vec<ParameterSet>,
    num_threads: Option<usize>,
    show_progress: bool,
) -> SweepResult<Vec<SimulationResult>> {
    let total = parameter_sets.len();
    let pb = if show_progress && total > 0 {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )?
                .progress_chars("#>-"),
        );
        Some(bar)
    } else {
        None
    };

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = num_threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build()?;

    log::info!("running {total} simulations");
    let results: ConfigResult<Vec<SimulationResult>> = pool.install(|| {
        parameter_sets
            .par_iter()
            .map(|param_set| {
                let result = run_single_simulation(param_set);
                if let Some(ref progress_bar) = pb {
                    progress_bar.inc(1);
                }
                result
            })
            .collect()
    });

    if let Some(ref progress_bar) = pb {
        progress_bar.finish_with_message("Completed");
    }

    Ok(results?)
}

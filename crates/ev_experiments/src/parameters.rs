//! Parameter variation framework for exploring the scenario space.
//!
//! A [ParameterSpace] lists the values to try for each varied dimension; the
//! rest come from a base [ScenarioParams]. Supports grid search and random
//! sampling.

use ev_core::policy::ChargingPolicyKind;
use ev_core::scenario::ScenarioParams;

mod combinations;
mod constraints;
mod conversion;
mod sampling;

use combinations::ParameterVariations;
use constraints::is_valid_combination;
use conversion::combination_to_parameter_set;

/// A single parameter configuration for a simulation run.
///
/// Wraps `ScenarioParams` with experiment metadata for tracking and
/// reproducibility.
#[derive(Debug, Clone)]
pub struct ParameterSet {
    /// Base scenario parameters.
    pub params: ScenarioParams,
    /// Identifies the parameter configuration; replications share it.
    pub experiment_id: String,
    /// Replication index within the experiment.
    pub run_id: usize,
    /// Seed used for this run.
    pub seed: u64,
}

impl ParameterSet {
    pub fn new(params: ScenarioParams, experiment_id: String, run_id: usize, seed: u64) -> Self {
        Self {
            params,
            experiment_id,
            run_id,
            seed,
        }
    }

    /// The scenario params with the run seed applied.
    pub fn scenario_params(&self) -> ScenarioParams {
        let mut params = self.params.clone();
        params.seed = Some(self.seed);
        params
    }
}

/// Defines a parameter space for exploration.
#[derive(Debug, Clone)]
pub struct ParameterSpace {
    base: ScenarioParams,
    policies: Vec<ChargingPolicyKind>,
    max_concurrent_charges: Vec<usize>,
    storage_capacities: Vec<usize>,
    num_users: Vec<usize>,
    charging_times_ms: Vec<u64>,
    patience_ms: Vec<Option<u64>>,
    simulation_duration_hours: Vec<Option<u64>>,
    replications: usize,
}

impl Default for ParameterSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterSpace {
    /// Create a new parameter space with default base parameters.
    pub fn new() -> Self {
        Self {
            base: ScenarioParams::default(),
            policies: vec![],
            max_concurrent_charges: vec![],
            storage_capacities: vec![],
            num_users: vec![],
            charging_times_ms: vec![],
            patience_ms: vec![],
            simulation_duration_hours: vec![],
            replications: 1,
        }
    }

    /// Create a new parameter space for grid search.
    pub fn grid() -> Self {
        Self::new()
    }

    pub fn policy(mut self, policies: Vec<ChargingPolicyKind>) -> Self {
        self.policies = policies;
        self
    }

    /// Set the number of charging slots per station to explore.
    pub fn max_concurrent_charges(mut self, slots: Vec<usize>) -> Self {
        self.max_concurrent_charges = slots;
        self
    }

    /// Set waiting-queue capacities to explore.
    pub fn storage_capacity(mut self, capacities: Vec<usize>) -> Self {
        self.storage_capacities = capacities;
        self
    }

    pub fn num_users(mut self, counts: Vec<usize>) -> Self {
        self.num_users = counts;
        self
    }

    pub fn charging_time_ms(mut self, times: Vec<u64>) -> Self {
        self.charging_times_ms = times;
        self
    }

    /// Set user patience values to explore (`None` waits until charged).
    pub fn patience_ms(mut self, patience: Vec<Option<u64>>) -> Self {
        self.patience_ms = patience;
        self
    }

    /// Set simulation durations, counted from the end of the departure window.
    pub fn simulation_duration_hours(mut self, durations: Vec<Option<u64>>) -> Self {
        self.simulation_duration_hours = durations;
        self
    }

    /// Runs per configuration, each with its own seed.
    pub fn replications(mut self, runs: usize) -> Self {
        self.replications = runs.max(1);
        self
    }

    /// Set base parameters (used as defaults).
    pub fn with_base(mut self, base: ScenarioParams) -> Self {
        self.base = base;
        self
    }

    /// Generate all parameter sets using grid search (Cartesian product).
    ///
    /// Unspecified dimensions take the base value. Combinations the scenario
    /// builder would reject are dropped.
    pub fn generate(&self) -> Vec<ParameterSet> {
        let variations = ParameterVariations::from_space(self);
        variations
            .generate_combinations()
            .into_iter()
            .filter(|combo| is_valid_combination(&self.base, combo))
            .enumerate()
            .flat_map(|(experiment_id, combo)| {
                (0..self.replications).map(move |run_id| {
                    combination_to_parameter_set(&self.base, &combo, experiment_id, run_id)
                })
            })
            .collect()
    }
}

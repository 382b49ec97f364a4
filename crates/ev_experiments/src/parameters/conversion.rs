use ev_core::clock::ONE_HOUR_MS;
use ev_core::scenario::ScenarioParams;

use super::combinations::ParameterCombination;
use super::ParameterSet;

pub(super) fn combination_to_parameter_set(
    base: &ScenarioParams,
    combo: &ParameterCombination,
    experiment_id: usize,
    run_id: usize,
) -> ParameterSet {
    let mut params = base.clone();
    params.policy = combo.policy;
    params.max_concurrent_charges = combo.max_concurrent_charges;
    params.storage_capacity = combo.storage_capacity;
    params.num_users = combo.num_users;
    params.charging_time_ms = combo.charging_time_ms;
    params.patience_ms = combo.patience_ms;

    if let Some(duration_hours) = combo.simulation_duration_hours {
        let end_time_ms = params
            .departure_window_ms
            .saturating_add(duration_hours * ONE_HOUR_MS);
        params.simulation_end_time_ms = Some(end_time_ms);
    }

    // Replications of one configuration differ only in their seed.
    let seed = (experiment_id as u64)
        .wrapping_mul(0x9e3779b9)
        .wrapping_add(run_id as u64);

    ParameterSet::new(params, format!("exp_{experiment_id}"), run_id, seed)
}

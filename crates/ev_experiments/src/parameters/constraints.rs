use ev_core::scenario::ScenarioParams;

use super::combinations::ParameterCombination;

/// Returns false for combinations the scenario builder would reject.
pub(super) fn is_valid_combination(base: &ScenarioParams, combo: &ParameterCombination) -> bool {
    combo.max_concurrent_charges > 0
        && combo.charging_time_ms > 0
        && combo.patience_ms != Some(0)
        && base.deployed_per_station <= combo.storage_capacity
}

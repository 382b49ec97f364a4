use ev_core::policy::ChargingPolicyKind;

use super::ParameterSpace;

/// One point of the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(super) struct ParameterCombination {
    pub(super) policy: ChargingPolicyKind,
    pub(super) max_concurrent_charges: usize,
    pub(super) storage_capacity: usize,
    pub(super) num_users: usize,
    pub(super) charging_time_ms: u64,
    pub(super) patience_ms: Option<u64>,
    pub(super) simulation_duration_hours: Option<u64>,
}

/// Values to explore per dimension, with unset dimensions filled from the base.
pub(super) struct ParameterVariations {
    policies: Vec<ChargingPolicyKind>,
    max_concurrent_charges: Vec<usize>,
    storage_capacities: Vec<usize>,
    num_users: Vec<usize>,
    charging_times_ms: Vec<u64>,
    patience_ms: Vec<Option<u64>>,
    simulation_duration_hours: Vec<Option<u64>>,
}

fn or_base<T: Clone>(values: &[T], base: T) -> Vec<T> {
    if values.is_empty() {
        vec![base]
    } else {
        values.to_vec()
    }
}

/// Cross every partial combination with every value of one dimension.
fn expand<T: Copy>(
    partial: Vec<ParameterCombination>,
    values: &[T],
    set: impl Fn(&mut ParameterCombination, T),
) -> Vec<ParameterCombination> {
    let set = &set;
    partial
        .into_iter()
        .flat_map(|combo| {
            values.iter().map(move |&value| {
                let mut next = combo;
                set(&mut next, value);
                next
            })
        })
        .collect()
}

impl ParameterVariations {
    pub(super) fn from_space(space: &ParameterSpace) -> Self {
        let base = &space.base;
        Self {
            policies: or_base(&space.policies, base.policy),
            max_concurrent_charges: or_base(
                &space.max_concurrent_charges,
                base.max_concurrent_charges,
            ),
            storage_capacities: or_base(&space.storage_capacities, base.storage_capacity),
            num_users: or_base(&space.num_users, base.num_users),
            charging_times_ms: or_base(&space.charging_times_ms, base.charging_time_ms),
            patience_ms: or_base(&space.patience_ms, base.patience_ms),
            // No duration keeps the base end time.
            simulation_duration_hours: or_base(&space.simulation_duration_hours, None),
        }
    }

    /// Cartesian product of all dimensions, policy varying slowest.
    pub(super) fn generate_combinations(&self) -> Vec<ParameterCombination> {
        let combos = vec![ParameterCombination::default()];
        let combos = expand(combos, &self.policies, |c, v| c.policy = v);
        let combos = expand(combos, &self.max_concurrent_charges, |c, v| {
            c.max_concurrent_charges = v
        });
        let combos = expand(combos, &self.storage_capacities, |c, v| c.storage_capacity = v);
        let combos = expand(combos, &self.num_users, |c, v| c.num_users = v);
        let combos = expand(combos, &self.charging_times_ms, |c, v| c.charging_time_ms = v);
        let combos = expand(combos, &self.patience_ms, |c, v| c.patience_ms = v);
        expand(combos, &self.simulation_duration_hours, |c, v| {
            c.simulation_duration_hours = v
        })
    }
}

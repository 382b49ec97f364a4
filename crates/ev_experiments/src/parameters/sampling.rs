use std::collections::HashSet;

use ev_core::clock::ONE_HOUR_MS;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use super::combinations::ParameterCombination;
use super::constraints::is_valid_combination;
use super::{ParameterSet, ParameterSpace};

fn pick<T: Copy, R: Rng>(rng: &mut R, values: &[T], base: T) -> T {
    if values.is_empty() {
        base
    } else {
        values[rng.gen_range(0..values.len())]
    }
}

impl ParameterSpace {
    /// Generate random parameter sets (Monte Carlo sampling).
    ///
    /// Samples up to `count` distinct configurations from the defined space.
    /// Stops early when the space has fewer distinct points than requested.
    pub fn sample_random(&self, count: usize, seed: u64) -> Vec<ParameterSet> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut parameter_sets = Vec::new();
        let mut seen = HashSet::new();
        let mut attempts = 0;
        const MAX_ATTEMPTS: usize = 10000;

        while parameter_sets.len() < count && attempts < MAX_ATTEMPTS {
            attempts += 1;
            let combo = ParameterCombination {
                policy: pick(&mut rng, &self.policies, self.base.policy),
                max_concurrent_charges: pick(
                    &mut rng,
                    &self.max_concurrent_charges,
                    self.base.max_concurrent_charges,
                ),
                storage_capacity: pick(
                    &mut rng,
                    &self.storage_capacities,
                    self.base.storage_capacity,
                ),
                num_users: pick(&mut rng, &self.num_users, self.base.num_users),
                charging_time_ms: pick(
                    &mut rng,
                    &self.charging_times_ms,
                    self.base.charging_time_ms,
                ),
                patience_ms: pick(&mut rng, &self.patience_ms, self.base.patience_ms),
                simulation_duration_hours: pick(&mut rng, &self.simulation_duration_hours, None),
            };
            if !is_valid_combination(&self.base, &combo) {
                continue;
            }
            if !seen.insert(format!("{combo:?}")) {
                continue;
            }

            let mut params = self.base.clone();
            params.policy = combo.policy;
            params.max_concurrent_charges = combo.max_concurrent_charges;
            params.storage_capacity = combo.storage_capacity;
            params.num_users = combo.num_users;
            params.charging_time_ms = combo.charging_time_ms;
            params.patience_ms = combo.patience_ms;
            if let Some(hours) = combo.simulation_duration_hours {
                params.simulation_end_time_ms =
                    Some(params.departure_window_ms.saturating_add(hours * ONE_HOUR_MS));
            }

            let seed_value = seed
                .wrapping_add(parameter_sets.len() as u64)
                .wrapping_mul(0x9e3779b9);
            parameter_sets.push(ParameterSet::new(
                params,
                format!("random_{}", parameter_sets.len()),
                0,
                seed_value,
            ));
        }

        parameter_sets
    }
}

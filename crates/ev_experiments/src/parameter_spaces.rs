//! Pre-defined parameter spaces.

use ev_core::clock::ONE_MIN_MS;
use ev_core::policy::ChargingPolicyKind;

use crate::ParameterSpace;

const BOTH_POLICIES: [ChargingPolicyKind; 2] = [ChargingPolicyKind::Fifo, ChargingPolicyKind::Lifo];

/// Policy against 1, 3 and 10 charging slots per station.
pub fn concurrency_space() -> ParameterSpace {
    ParameterSpace::grid()
        .policy(BOTH_POLICIES.to_vec())
        .max_concurrent_charges(vec![1, 3, 10])
        .num_users(vec![300])
        .replications(3)
}

/// Full exploration of station sizing against demand.
pub fn comprehensive_space() -> ParameterSpace {
    ParameterSpace::grid()
        .policy(BOTH_POLICIES.to_vec())
        .max_concurrent_charges(vec![1, 3, 10])
        .storage_capacity(vec![5, 15, 30])
        .num_users(vec![100, 300, 1000])
        .charging_time_ms(vec![30 * ONE_MIN_MS, 60 * ONE_MIN_MS])
        .patience_ms(vec![None, Some(30 * ONE_MIN_MS)])
        .replications(2)
}

/// How patient users have to be under each policy.
pub fn patience_space() -> ParameterSpace {
    ParameterSpace::grid()
        .policy(BOTH_POLICIES.to_vec())
        .max_concurrent_charges(vec![2])
        .storage_capacity(vec![10])
        .num_users(vec![500])
        .patience_ms(vec![
            Some(10 * ONE_MIN_MS),
            Some(30 * ONE_MIN_MS),
            Some(60 * ONE_MIN_MS),
            None,
        ])
        .replications(3)
}

/// FIFO, LIFO and dual-stack storage under a tight queue.
pub fn storage_layout_space() -> ParameterSpace {
    ParameterSpace::grid()
        .policy(ChargingPolicyKind::ALL.to_vec())
        .max_concurrent_charges(vec![1, 3])
        .storage_capacity(vec![4, 10])
        .num_users(vec![300])
        .replications(3)
}

/// Quick testing.
pub fn minimal_space() -> ParameterSpace {
    ParameterSpace::grid()
        .policy(BOTH_POLICIES.to_vec())
        .max_concurrent_charges(vec![1, 3])
        .num_users(vec![50])
}

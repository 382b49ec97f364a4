//! Service-quality score calculation.
//!
//! Combines several metrics into one weighted score per run so that runs of a
//! sweep can be ranked against each other.

use crate::metrics::SimulationResult;

/// Configurable weights for the service-quality score.
///
/// # Default Weights
///
/// - Service rate: 0.35
/// - Trip completion: 0.2
/// - Average wait: 0.25 (inverted, lower is better)
/// - P90 wait: 0.1 (inverted, lower is better)
/// - Lost customers: -0.2 (turned away plus abandoned, penalty)
/// - Stranded users: -0.1 (penalty)
#[derive(Debug, Clone, Copy)]
pub struct ScoreWeights {
    pub service_weight: f64,
    pub completion_weight: f64,
    /// Applied to the inverted average wait.
    pub avg_wait_weight: f64,
    /// Applied to the inverted p90 wait.
    pub p90_wait_weight: f64,
    pub lost_penalty: f64,
    pub stranded_penalty: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            service_weight: 0.35,
            completion_weight: 0.2,
            avg_wait_weight: 0.25,
            p90_wait_weight: 0.1,
            lost_penalty: -0.2,
            stranded_penalty: -0.1,
        }
    }
}

impl ScoreWeights {
    pub fn new(
        service_weight: f64,
        completion_weight: f64,
        avg_wait_weight: f64,
        p90_wait_weight: f64,
        lost_penalty: f64,
        stranded_penalty: f64,
    ) -> Self {
        Self {
            service_weight,
            completion_weight,
            avg_wait_weight,
            p90_wait_weight,
            lost_penalty,
            stranded_penalty,
        }
    }
}

/// Min-max normalization into [0, 1]. Returns 0.5 when all values are equal.
fn normalize_metric(value: f64, min: f64, max: f64) -> f64 {
    if max == min {
        0.5
    } else {
        ((value - min) / (max - min)).clamp(0.0, 1.0)
    }
}

fn bounds(results: &[SimulationResult], metric: impl Fn(&SimulationResult) -> f64) -> (f64, f64) {
    results
        .iter()
        .map(metric)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
            (min.min(v), max.max(v))
        })
}

fn lost(result: &SimulationResult) -> f64 {
    (result.turned_away + result.abandoned_waits) as f64
}

/// Calculate scores for all simulation results.
///
/// Metrics are normalized across the given results, so scores only compare
/// runs of the same sweep. Higher is better. Output order matches input.
pub fn calculate_scores(results: &[SimulationResult], weights: &ScoreWeights) -> Vec<f64> {
    if results.is_empty() {
        return vec![];
    }

    let (service_min, service_max) = bounds(results, |r| r.service_rate);
    let (completion_min, completion_max) = bounds(results, |r| r.completion_rate);
    let (avg_wait_min, avg_wait_max) = bounds(results, |r| r.avg_wait_ms);
    let (p90_wait_min, p90_wait_max) = bounds(results, |r| r.p90_wait_ms);
    let (lost_min, lost_max) = bounds(results, lost);
    let (stranded_min, stranded_max) = bounds(results, |r| r.stranded_users as f64);

    results
        .iter()
        .map(|result| {
            let service_norm = normalize_metric(result.service_rate, service_min, service_max);
            let completion_norm =
                normalize_metric(result.completion_rate, completion_min, completion_max);

            // Lower is better from here on.
            let avg_wait_norm =
                1.0 - normalize_metric(result.avg_wait_ms, avg_wait_min, avg_wait_max);
            let p90_wait_norm =
                1.0 - normalize_metric(result.p90_wait_ms, p90_wait_min, p90_wait_max);
            let lost_norm = normalize_metric(lost(result), lost_min, lost_max);
            let stranded_norm =
                normalize_metric(result.stranded_users as f64, stranded_min, stranded_max);

            service_norm * weights.service_weight
                + completion_norm * weights.completion_weight
                + avg_wait_norm * weights.avg_wait_weight
                + p90_wait_norm * weights.p90_wait_weight
                + lost_norm * weights.lost_penalty
                + stranded_norm * weights.stranded_penalty
        })
        .collect()
}

use crate::metrics::SimulationResult;
use crate::parameters::ParameterSet;
use crate::scoring::{calculate_scores, ScoreWeights};

pub(crate) fn find_best_index_by_score(
    results: &[SimulationResult],
    weights: &ScoreWeights,
) -> Option<usize> {
    let scores = calculate_scores(results, weights);
    scores
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(idx, _)| idx)
}

pub(crate) fn find_best_parameters_impl<'a>(
    results: &'a [SimulationResult],
    parameter_sets: &'a [ParameterSet],
    weights: &'a ScoreWeights,
) -> Option<&'a ParameterSet> {
    if results.is_empty() || results.len() != parameter_sets.len() {
        return None;
    }

    let best_idx = find_best_index_by_score(results, weights)?;
    parameter_sets.get(best_idx)
}

//! Result export and analysis utilities.
//!
//! Exports experiment results to CSV and JSON, and finds the best parameter
//! combination by score.

use std::fs::File;
use std::path::Path;

use crate::metrics::SimulationResult;
use crate::parameters::ParameterSet;
use crate::scoring::ScoreWeights;

#[path = "export/csv.rs"]
mod csv;
#[path = "export/ranking.rs"]
mod ranking;

fn create_output_file(path: impl AsRef<Path>) -> Result<File, Box<dyn std::error::Error>> {
    Ok(File::create(path)?)
}

/// Export simulation results to JSON format (an array of objects).
///
/// # Errors
///
/// Returns an error if file creation or JSON serialization fails.
pub fn export_to_json(
    results: &[SimulationResult],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = create_output_file(path)?;
    serde_json::to_writer_pretty(file, results)?;
    Ok(())
}

/// Export simulation results with their parameters to CSV format.
///
/// One row per run; `results[i]` belongs to `parameter_sets[i]`.
///
/// # Errors
///
/// Returns an error if file creation or CSV writing fails, or if the two
/// slices differ in length.
pub fn export_to_csv(
    results: &[SimulationResult],
    parameter_sets: &[ParameterSet],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    if results.is_empty() {
        return Err("No results to export".into());
    }
    let file = create_output_file(path)?;
    csv::export_to_csv_impl(results, parameter_sets, file)
}

/// Find the parameter set with the highest score.
///
/// Returns `None` if inputs are empty or their lengths differ.
pub fn find_best_parameters<'a>(
    results: &'a [SimulationResult],
    parameter_sets: &'a [ParameterSet],
    weights: &'a ScoreWeights,
) -> Option<&'a ParameterSet> {
    ranking::find_best_parameters_impl(results, parameter_sets, weights)
}

/// Index of the best-scoring result, or `None` if `results` is empty.
pub fn find_best_result_index(results: &[SimulationResult], weights: &ScoreWeights) -> Option<usize> {
    ranking::find_best_index_by_score(results, weights)
}

//! Example: policy and concurrency sweep.
//!
//! 1. Select a pre-defined parameter space
//! 2. Run the simulations in parallel
//! 3. Score them and pick the best configuration
//! 4. Export results to CSV and JSON
//!
//! To use a different parameter space, change the function call in main().

use ev_experiments::{
    export_to_csv, export_to_json, find_best_parameters, find_best_result_index,
    run_parallel_experiments, ScoreWeights,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    ev_core::logging::init(Some(log::LevelFilter::Warn), None)?;
    println!("Starting parameter sweep experiment...");

    // - concurrency_space(): FIFO/LIFO against 1, 3, 10 slots
    // - patience_space(): patience limits under each policy
    // - comprehensive_space(): everything
    // - minimal_space(): quick testing
    let space = ev_experiments::parameter_spaces::concurrency_space();

    let parameter_sets = space.generate();
    println!("Generated {} parameter sets", parameter_sets.len());

    let results = run_parallel_experiments(parameter_sets.clone(), None).map_err(|e| e.to_string())?;
    println!("Completed {} simulations", results.len());

    let weights = ScoreWeights::default();
    let best_idx = find_best_result_index(&results, &weights).ok_or("No results to analyze")?;

    println!("\n=== Best Run ===");
    let best = &results[best_idx];
    println!("Service rate: {:.1}%", best.service_rate * 100.0);
    println!("Trip completion: {:.1}%", best.completion_rate * 100.0);
    println!("Avg wait: {:.1} min", best.avg_wait_ms / 60_000.0);
    println!("P90 wait: {:.1} min", best.p90_wait_ms / 60_000.0);
    println!("Turned away: {}", best.turned_away);
    println!("Abandoned waits: {}", best.abandoned_waits);
    println!("Stranded users: {}", best.stranded_users);

    if let Some(best_params) = find_best_parameters(&results, &parameter_sets, &weights) {
        println!("\n=== Best Parameters ===");
        println!("Policy: {}", best_params.params.policy.name());
        println!("Charging slots: {}", best_params.params.max_concurrent_charges);
        println!("Queue capacity: {}", best_params.params.storage_capacity);
        println!("Users: {}", best_params.params.num_users);
    }

    export_to_csv(&results, &parameter_sets, "experiment_results.csv")?;
    println!("\nExported to experiment_results.csv");
    export_to_json(&results, "experiment_results.json")?;
    println!("Exported to experiment_results.json");

    Ok(())
}

use crate::metrics::SimulationResult;
use crate::parameters::ParameterSet;

pub(crate) fn export_to_csv_impl(
    results: &[SimulationResult],
    parameter_sets: &[ParameterSet],
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    if results.len() != parameter_sets.len() {
        return Err(format!(
            "Results length ({}) doesn't match parameter_sets length ({})",
            results.len(),
            parameter_sets.len()
        )
        .into());
    }

    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record([
        "experiment_id",
        "run_id",
        "seed",
        "policy",
        "max_concurrent_charges",
        "storage_capacity",
        "num_users",
        "trips_per_user",
        "charging_time_ms",
        "patience_ms",
        "simulation_end_time_ms",
        "total_users",
        "total_stations",
        "planned_trips",
        "trips_completed",
        "completion_rate",
        "charges_completed",
        "charges_interrupted",
        "turned_away",
        "abandoned_waits",
        "stranded_users",
        "service_rate",
        "avg_wait_ms",
        "median_wait_ms",
        "p90_wait_ms",
        "avg_time_at_station_ms",
        "energy_delivered",
        "peak_queue",
        "events_processed",
    ])?;

    for (result, param_set) in results.iter().zip(parameter_sets.iter()) {
        let params = &param_set.params;
        wtr.write_record([
            &param_set.experiment_id,
            &param_set.run_id.to_string(),
            &param_set.seed.to_string(),
            params.policy.name(),
            &params.max_concurrent_charges.to_string(),
            &params.storage_capacity.to_string(),
            &params.num_users.to_string(),
            &params.trips_per_user.to_string(),
            &params.charging_time_ms.to_string(),
            &params.patience_ms.map(|p| p.to_string()).unwrap_or_default(),
            &params
                .simulation_end_time_ms
                .map(|e| e.to_string())
                .unwrap_or_default(),
            &result.total_users.to_string(),
            &result.total_stations.to_string(),
            &result.planned_trips.to_string(),
            &result.trips_completed.to_string(),
            &result.completion_rate.to_string(),
            &result.charges_completed.to_string(),
            &result.charges_interrupted.to_string(),
            &result.turned_away.to_string(),
            &result.abandoned_waits.to_string(),
            &result.stranded_users.to_string(),
            &result.service_rate.to_string(),
            &result.avg_wait_ms.to_string(),
            &result.median_wait_ms.to_string(),
            &result.p90_wait_ms.to_string(),
            &result.avg_time_at_station_ms.to_string(),
            &result.energy_delivered.to_string(),
            &result.peak_queue.to_string(),
            &result.events_processed.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

use std::path::PathBuf;
use std::process::exit;

use clap::{Parser, ValueEnum};
use ev_core::clock::{ONE_HOUR_MS, ONE_MIN_MS};
use ev_core::policy::ChargingPolicyKind;
use ev_core::scenario::ScenarioParams;
use ev_core::simulation::{run_scenario, SimulationRun};
use ev_core::vehicle::VehicleSpecs;
use ev_experiments::metrics::{extract_metrics, SimulationResult};
use log::LevelFilter;

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "ev-sim",
    about = "Run one EV charging-station scenario and print its outcome",
    long_about = "Builds a network of charging stations and users from a JSON scenario\n\
                  (or the defaults), runs it to completion and prints a summary.\n\
                  Flags override the matching scenario keys."
)]
struct Cli {
    /// Scenario parameters (JSON, missing keys take defaults)
    #[arg(long, env = "EV_SIM_SCENARIO")]
    scenario: Option<PathBuf>,
    /// Per-kind vehicle constants (JSON, kinds not listed keep defaults)
    #[arg(long, env = "EV_SIM_VEHICLES")]
    vehicles: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(value_enum, long)]
    policy: Option<Policy>,
    /// Charging slots per station
    #[arg(long)]
    slots: Option<usize>,
    /// Waiting-queue capacity per station
    #[arg(long)]
    queue: Option<usize>,
    #[arg(long)]
    users: Option<usize>,
    #[arg(long)]
    trips: Option<u32>,
    /// Minutes a user waits at a station before leaving
    #[arg(long)]
    patience_min: Option<u64>,
    /// Stop the run after this many simulated hours
    #[arg(long)]
    end_hours: Option<u64>,
    /// Print the metrics as JSON instead of text
    #[arg(long)]
    json: bool,
    #[arg(value_enum, long, env = "EV_SIM_LOG")]
    log_level: Option<Level>,
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Policy {
    Fifo,
    Lifo,
    DualStack,
}

impl From<Policy> for ChargingPolicyKind {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Fifo => ChargingPolicyKind::Fifo,
            Policy::Lifo => ChargingPolicyKind::Lifo,
            Policy::DualStack => ChargingPolicyKind::DualStack,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Level {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<Level> for LevelFilter {
    fn from(level: Level) -> Self {
        match level {
            Level::Error => LevelFilter::Error,
            Level::Warn => LevelFilter::Warn,
            Level::Info => LevelFilter::Info,
            Level::Debug => LevelFilter::Debug,
            Level::Trace => LevelFilter::Trace,
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn scenario_params(cli: &Cli) -> ev_core::error::Result<ScenarioParams> {
    let mut params = match &cli.scenario {
        Some(path) => ScenarioParams::from_file(path)?,
        None => ScenarioParams::default(),
    };
    if let Some(seed) = cli.seed {
        params.seed = Some(seed);
    }
    if let Some(policy) = cli.policy {
        params.policy = policy.into();
    }
    if let Some(slots) = cli.slots {
        params.max_concurrent_charges = slots;
    }
    if let Some(queue) = cli.queue {
        params.storage_capacity = queue;
    }
    if let Some(users) = cli.users {
        params.num_users = users;
    }
    if let Some(trips) = cli.trips {
        params.trips_per_user = trips;
    }
    if let Some(minutes) = cli.patience_min {
        params.patience_ms = Some(minutes * ONE_MIN_MS);
    }
    if let Some(hours) = cli.end_hours {
        params.simulation_end_time_ms = Some(hours * ONE_HOUR_MS);
    }
    params.validate()?;
    Ok(params)
}

fn print_summary(params: &ScenarioParams, result: &SimulationResult) {
    let minutes = |ms: f64| ms / ONE_MIN_MS as f64;
    println!("=== Scenario ===");
    println!(
        "{} stations, {} slots and queue {} each, {} policy",
        result.total_stations,
        params.max_concurrent_charges,
        params.storage_capacity,
        params.policy.name()
    );
    println!(
        "{} users x {} trips, charging time {:.0} min",
        result.total_users,
        params.trips_per_user,
        minutes(params.charging_time_ms as f64)
    );
    println!("\n=== Outcome ===");
    println!(
        "Trips completed: {}/{} ({:.1}%)",
        result.trips_completed,
        result.planned_trips,
        result.completion_rate * 100.0
    );
    println!(
        "Charges: {} full, {} interrupted ({:.1}% served)",
        result.charges_completed,
        result.charges_interrupted,
        result.service_rate * 100.0
    );
    println!(
        "Turned away: {}, abandoned waits: {}, stranded: {}",
        result.turned_away, result.abandoned_waits, result.stranded_users
    );
    println!(
        "Wait: avg {:.1} min, median {:.1} min, p90 {:.1} min",
        minutes(result.avg_wait_ms),
        minutes(result.median_wait_ms),
        minutes(result.p90_wait_ms)
    );
    println!("Energy delivered: {:.0}", result.energy_delivered);
    println!("Peak queue: {}", result.peak_queue);
    println!("Events processed: {}", result.events_processed);
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let params = scenario_params(cli)?;
    let specs = cli.vehicles.as_ref().map(VehicleSpecs::from_file).transpose()?;

    let SimulationRun {
        mut world, steps, ..
    } = run_scenario(params.clone(), specs)?;
    let result = extract_metrics(&mut world, &params, steps);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&params, &result);
    }
    Ok(())
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    let level = cli.log_level.map(LevelFilter::from);
    if let Err(err) = ev_core::logging::init(level, cli.log_file.as_deref()) {
        eprintln!("failed to set up logging: {err}");
        exit(1);
    }

    if let Err(err) = run(&cli) {
        log::error!("{err}");
        eprintln!("error: {err}");
        exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "ev-sim",
            "--seed",
            "7",
            "--policy",
            "lifo",
            "--slots",
            "10",
            "--patience-min",
            "15",
        ]);
        let params = scenario_params(&cli).unwrap();
        assert_eq!(params.seed, Some(7));
        assert_eq!(params.policy, ChargingPolicyKind::Lifo);
        assert_eq!(params.max_concurrent_charges, 10);
        assert_eq!(params.patience_ms, Some(15 * ONE_MIN_MS));
    }

    #[test]
    fn dual_stack_policy_flag() {
        let cli = Cli::parse_from(["ev-sim", "--policy", "dual-stack", "--queue", "6"]);
        let params = scenario_params(&cli).unwrap();
        assert_eq!(params.policy, ChargingPolicyKind::DualStack);
        assert_eq!(params.storage_capacity, 6);
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let cli = Cli::parse_from(["ev-sim", "--slots", "0"]);
        assert!(scenario_params(&cli).is_err());
    }
}

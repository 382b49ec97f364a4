//! Run a 9-station grid with 200 users and print charging KPIs.
//!
//! Run with: cargo run -p ev_core --example scenario_run

use ev_core::clock::{SimulationClock, ONE_MIN_MS};
use ev_core::policy::ChargingPolicyKind;
use ev_core::scenario::ScenarioParams;
use ev_core::simulation::run_scenario;
use ev_core::telemetry::SimTelemetry;

fn main() {
    const NUM_USERS: usize = 200;
    const TRIPS: u32 = 3;

    for policy in ChargingPolicyKind::ALL {
        let params = ScenarioParams::default()
            .with_seed(123)
            .with_users(NUM_USERS, TRIPS)
            .with_policy(policy)
            .with_max_concurrent_charges(3)
            .with_storage_capacity(10)
            .with_patience_ms(90 * ONE_MIN_MS);

        let run = match run_scenario(params, None) {
            Ok(run) => run,
            Err(err) => {
                eprintln!("scenario failed: {err}");
                std::process::exit(1);
            }
        };

        let telemetry = run.world.resource::<SimTelemetry>();
        let clock = run.world.resource::<SimulationClock>();
        let mut waits = telemetry.wait_times();
        waits.sort_unstable();
        let median = waits.get(waits.len() / 2).copied().unwrap_or(0);

        println!("--- {} ({} users x {} trips, seed 123) ---", policy.name(), NUM_USERS, TRIPS);
        println!("Steps executed: {}", run.steps);
        println!("Simulation time: {:.1} min", clock.now() as f64 / ONE_MIN_MS as f64);
        println!("Charges: {} ({} interrupted)", telemetry.charges.len(), telemetry.charges.iter().filter(|c| c.interrupted).count());
        println!("Median wait: {:.1} min", median as f64 / ONE_MIN_MS as f64);
        println!("Turned away: {}  abandoned: {}  stranded: {}", telemetry.turned_away, telemetry.abandoned_waits, telemetry.stranded.len());
        println!("Peak queue: {}", telemetry.peak_queue());
        println!();
    }
}

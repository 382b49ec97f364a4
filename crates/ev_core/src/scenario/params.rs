use std::fs;
use std::path::Path;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::clock::{ONE_HOUR_MS, ONE_MIN_MS};
use crate::error::{ConfigError, Result};
use crate::policy::ChargingPolicyKind;
use crate::spatial::StationLayout;
use crate::storage::StationStorage;

/// Simulation end time in milliseconds. When set, the runner stops processing events
/// once the next event would be at or after this timestamp (so the simulation "ends" at this time).
#[derive(Debug, Clone, Copy, Resource)]
pub struct SimulationEndTimeMs(pub u64);

/// Parameters for building a simulation scenario. Every field has a default,
/// so a JSON file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioParams {
    pub seed: Option<u64>,
    pub layout: StationLayout,
    /// Time to fully charge one vehicle.
    pub charging_time_ms: u64,
    pub max_concurrent_charges: usize,
    /// Waiting-queue bound of each station.
    pub storage_capacity: usize,
    pub policy: ChargingPolicyKind,
    /// Size of stack 1 under [`ChargingPolicyKind::DualStack`]; stack 2 gets
    /// the rest of `storage_capacity`. `None` splits evenly.
    pub dual_stack_split: Option<usize>,
    pub num_users: usize,
    /// Fraction of users riding a bike; the rest ride scooters.
    pub bike_share: f64,
    pub trips_per_user: u32,
    /// First departures are spread uniformly over `[0, departure_window_ms]`.
    pub departure_window_ms: u64,
    /// Pause between two trips of the same user.
    pub dwell_ms: u64,
    /// Longest a user stays at a station. `None` waits until charged.
    pub patience_ms: Option<u64>,
    /// Initial battery, as a fraction of capacity, drawn from this range.
    pub min_initial_battery: f64,
    pub max_initial_battery: f64,
    /// Parked vehicles queued at every station when the run starts.
    pub deployed_per_station: usize,
    pub simulation_end_time_ms: Option<u64>,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            seed: None,
            layout: StationLayout::default(),
            charging_time_ms: ONE_HOUR_MS,
            max_concurrent_charges: 3,
            storage_capacity: 30,
            policy: ChargingPolicyKind::Fifo,
            dual_stack_split: None,
            num_users: 100,
            bike_share: 0.5,
            trips_per_user: 3,
            departure_window_ms: 2 * ONE_HOUR_MS,
            dwell_ms: 10 * ONE_MIN_MS,
            patience_ms: None,
            min_initial_battery: 0.6,
            max_initial_battery: 1.0,
            deployed_per_station: 0,
            simulation_end_time_ms: None,
        }
    }
}

impl ScenarioParams {
    /// Read a scenario from JSON. Missing keys take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&raw)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        if self.max_concurrent_charges == 0 {
            return invalid("max_concurrent_charges must be at least 1".into());
        }
        if self.charging_time_ms == 0 {
            return invalid("charging_time_ms must be positive".into());
        }
        if self.deployed_per_station > self.storage_capacity {
            return invalid(format!(
                "deployed_per_station ({}) exceeds storage_capacity ({})",
                self.deployed_per_station, self.storage_capacity
            ));
        }
        if let Some(split) = self.dual_stack_split {
            if split > self.storage_capacity {
                return invalid(format!(
                    "dual_stack_split ({split}) exceeds storage_capacity ({})",
                    self.storage_capacity
                ));
            }
        }
        if !(0.0..=1.0).contains(&self.bike_share) {
            return invalid(format!("bike_share must be in [0, 1], got {}", self.bike_share));
        }
        let battery = 0.0..=1.0;
        if !battery.contains(&self.min_initial_battery)
            || !battery.contains(&self.max_initial_battery)
            || self.min_initial_battery > self.max_initial_battery
        {
            return invalid(format!(
                "initial battery range [{}, {}] must lie within [0, 1]",
                self.min_initial_battery, self.max_initial_battery
            ));
        }
        if self.patience_ms == Some(0) {
            return invalid("patience_ms must be positive when set".into());
        }
        if self.layout.capacity() == 0 {
            return invalid("station layout produces no stations".into());
        }
        Ok(())
    }

    /// Empty storage for one station, laid out per `policy`.
    pub fn station_storage(&self) -> StationStorage {
        match (self.policy, self.dual_stack_split) {
            (ChargingPolicyKind::DualStack, Some(split)) => {
                StationStorage::dual_stack(split, self.storage_capacity.saturating_sub(split))
            }
            (policy, _) => StationStorage::new(self.storage_capacity, policy),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_layout(mut self, layout: StationLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_policy(mut self, policy: ChargingPolicyKind) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_dual_stack_split(mut self, stack1_size: usize) -> Self {
        self.policy = ChargingPolicyKind::DualStack;
        self.dual_stack_split = Some(stack1_size);
        self
    }

    pub fn with_max_concurrent_charges(mut self, slots: usize) -> Self {
        self.max_concurrent_charges = slots;
        self
    }

    pub fn with_storage_capacity(mut self, capacity: usize) -> Self {
        self.storage_capacity = capacity;
        self
    }

    pub fn with_charging_time_ms(mut self, charging_time_ms: u64) -> Self {
        self.charging_time_ms = charging_time_ms;
        self
    }

    pub fn with_users(mut self, num_users: usize, trips_per_user: u32) -> Self {
        self.num_users = num_users;
        self.trips_per_user = trips_per_user;
        self
    }

    pub fn with_bike_share(mut self, bike_share: f64) -> Self {
        self.bike_share = bike_share;
        self
    }

    /// Spread first departures over `[0, hours]` of simulated time.
    pub fn with_departure_window_hours(mut self, hours: u64) -> Self {
        self.departure_window_ms = hours * ONE_HOUR_MS;
        self
    }

    pub fn with_dwell_ms(mut self, dwell_ms: u64) -> Self {
        self.dwell_ms = dwell_ms;
        self
    }

    pub fn with_patience_ms(mut self, patience_ms: u64) -> Self {
        self.patience_ms = Some(patience_ms);
        self
    }

    pub fn with_initial_battery(mut self, min: f64, max: f64) -> Self {
        self.min_initial_battery = min;
        self.max_initial_battery = max;
        self
    }

    pub fn with_deployed_per_station(mut self, count: usize) -> Self {
        self.deployed_per_station = count;
        self
    }

    /// Set simulation end time in ms. Runner stops when the next event is at or after this time.
    pub fn with_simulation_end_time_ms(mut self, end_ms: u64) -> Self {
        self.simulation_end_time_ms = Some(end_ms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        ScenarioParams::default().validate().expect("valid defaults");
    }

    #[test]
    fn validation_rejects_contract_breaking_values() {
        let cases = [
            ScenarioParams::default().with_max_concurrent_charges(0),
            ScenarioParams::default()
                .with_storage_capacity(1)
                .with_deployed_per_station(2),
            ScenarioParams::default().with_bike_share(1.5),
            ScenarioParams::default().with_initial_battery(0.9, 0.1),
            ScenarioParams::default().with_patience_ms(0),
            ScenarioParams::default().with_charging_time_ms(0),
            ScenarioParams::default()
                .with_storage_capacity(4)
                .with_dual_stack_split(5),
        ];
        for params in cases {
            assert!(
                matches!(params.validate(), Err(ConfigError::Invalid(_))),
                "{params:?} should be invalid"
            );
        }
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"policy": "LIFO", "max_concurrent_charges": 10,
                "layout": {{"type": "circle_random", "radius": 4, "count": 6}}}}"#
        )
        .expect("write");

        let params = ScenarioParams::from_file(file.path()).expect("load");
        assert_eq!(params.policy, ChargingPolicyKind::Lifo);
        assert_eq!(params.max_concurrent_charges, 10);
        assert_eq!(
            params.layout,
            StationLayout::CircleRandom { radius: 4, count: 6 }
        );
        assert_eq!(params.storage_capacity, ScenarioParams::default().storage_capacity);
    }

    #[test]
    fn dual_stack_storage_uses_the_configured_split() {
        let params = ScenarioParams::default()
            .with_storage_capacity(10)
            .with_dual_stack_split(7);
        let storage = params.station_storage();
        assert_eq!(storage.capacity(), 10);
        assert_eq!(storage.stacks().expect("dual stack").sizes(), (7, 3));

        let even = ScenarioParams::default()
            .with_storage_capacity(10)
            .with_policy(ChargingPolicyKind::DualStack)
            .station_storage();
        assert_eq!(even.stacks().expect("dual stack").sizes(), (5, 5));
    }

    #[test]
    fn missing_scenario_file_is_not_found() {
        let err = ScenarioParams::from_file("/no/such/scenario.json").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}

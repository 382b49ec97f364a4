pub mod clock;
pub mod error;
pub mod logging;
pub mod policy;
pub mod profiling;
pub mod runner;
pub mod scenario;
pub mod simulation;
pub mod spatial;
pub mod station;
pub mod storage;
pub mod systems;
pub mod telemetry;
pub mod user;
pub mod vehicle;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;

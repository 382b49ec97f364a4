//! Parallel parameter sweeps over the charging-station simulation.
//!
//! Runs many scenarios side by side with different station configurations,
//! extracts service metrics from each run and scores them so the best
//! configuration can be picked.
//!
//! # Quick Start
//!
//! ```no_run
//! use ev_core::policy::ChargingPolicyKind;
//! use ev_experiments::{find_best_result_index, run_parallel_experiments, ParameterSpace, ScoreWeights};
//!
//! let space = ParameterSpace::grid()
//!     .policy(vec![ChargingPolicyKind::Fifo, ChargingPolicyKind::Lifo])
//!     .max_concurrent_charges(vec![1, 3, 10])
//!     .num_users(vec![100, 300]);
//!
//! let parameter_sets = space.generate();
//! let results = run_parallel_experiments(parameter_sets, None).unwrap();
//!
//! let best_idx = find_best_result_index(&results, &ScoreWeights::default()).unwrap();
//! ```
//!
//! # Modules
//!
//! - [`parameters`]: grid search and random sampling over scenario parameters
//! - [`runner`]: parallel execution with rayon
//! - [`metrics`]: metrics extraction from a finished world
//! - [`scoring`]: weighted service-quality score
//! - [`export`]: CSV/JSON export and best-configuration lookup

pub mod export;
pub mod metrics;
pub mod parameter_spaces;
pub mod parameters;
pub mod runner;
pub mod scoring;

pub use export::{export_to_csv, export_to_json, find_best_parameters, find_best_result_index};
pub use metrics::SimulationResult;
pub use parameters::{ParameterSet, ParameterSpace};
pub use runner::run_parallel_experiments;
pub use scoring::{calculate_scores, ScoreWeights};

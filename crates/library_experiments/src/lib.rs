//! Parallel experimentation framework for library simulation parameter sweeps.
//!
//! Runs many independent simulations with varying capacity, staffing, arrival rate and
//! stay probability, then extracts comparable metrics from each run.
//!
//! # Quick Start
//!
//! ```no_run
//! use library_experiments::{export_to_json, run_parallel_experiments, ParameterSpace};
//!
//! let space = ParameterSpace::grid()
//!     .capacity(vec![10, 20, 40])
//!     .employees(vec![1, 2, 3])
//!     .replications(1, 5);
//!
//! let results = run_parallel_experiments(space.generate(), None)?;
//! export_to_json(&results, "sweep.json")?;
//! # Ok::<(), library_experiments::ExperimentError>(())
//! ```
//!
//! # Architecture
//!
//! - [`config`]: TOML loading of the base configuration
//! - [`parameters`]: Parameter variation framework (grid search, random sampling)
//! - [`runner`]: Parallel simulation execution using rayon
//! - [`metrics`]: Metrics extraction from finished runs
//! - [`export`]: Result export to JSON

pub mod config;
pub mod error;
pub mod export;
pub mod metrics;
pub mod parameters;
pub mod runner;

pub use config::{load_config, parse_config};
pub use error::ExperimentError;
pub use export::{export_to_json, write_report_json, write_results_json};
pub use metrics::SimulationResult;
pub use parameters::{ParameterSet, ParameterSpace};
pub use runner::{run_parallel_experiments, run_parallel_experiments_with_progress};

pub mod clock;
pub mod config;
pub mod distributions;
pub mod ecs;
pub mod error;
pub mod integrator;
pub mod library;
pub mod runner;
pub mod scenario;
pub mod simulation;
pub mod snapshot;
pub mod systems;
pub mod telemetry;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;

pub use config::LibraryConfig;
pub use error::ConfigError;
pub use runner::RunStatus;
pub use simulation::{FinalMetrics, LibrarySimulation, SimulationReport};
pub use snapshot::{select_rows, SnapshotRow};

#![allow(dead_code)]

use library_core::clock::EventKind;
use library_core::config::LibraryConfig;
use library_core::simulation::{LibrarySimulation, SimulationReport};
use library_core::snapshot::SnapshotRow;

/// Builds and runs a simulation, panicking on an invalid config.
pub fn run_to_end(config: LibraryConfig) -> (LibrarySimulation, SimulationReport) {
    let mut simulation = LibrarySimulation::initialize(config).expect("valid config");
    let report = simulation.run();
    (simulation, report)
}

/// Clock values of the rows produced by events of `kind`.
pub fn event_times(rows: &[SnapshotRow], kind: EventKind) -> Vec<f64> {
    rows.iter()
        .filter(|row| row.event == Some(kind))
        .map(|row| row.clock)
        .collect()
}

/// A mixed configuration that fills up: short horizon, small room, slow desks.
pub fn crowded_config(seed: u64) -> LibraryConfig {
    LibraryConfig::default()
        .with_seed(seed)
        .with_horizon(240.0)
        .with_inter_arrival(2.0)
        .with_employees(2)
        .with_capacity(6)
}

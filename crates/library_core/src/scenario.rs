//! World construction from a [LibraryConfig].

use bevy_ecs::prelude::World;

use crate::clock::SimulationClock;
use crate::config::LibraryConfig;
use crate::distributions::VariateGenerator;
use crate::library::Library;
use crate::snapshot::SnapshotLog;
use crate::telemetry::{Counters, LibraryTelemetry, StepVariates};

/// Inserts every resource the schedule expects. The config is assumed validated.
pub fn build_scenario(world: &mut World, config: LibraryConfig) {
    world.insert_resource(SimulationClock::default());
    world.insert_resource(VariateGenerator::new(config.seed));
    world.insert_resource(Library::new(config.employees, config.capacity));
    world.insert_resource(Counters::default());
    world.insert_resource(StepVariates::default());
    world.insert_resource(LibraryTelemetry::default());
    world.insert_resource(SnapshotLog::default());
    world.insert_resource(config);
}

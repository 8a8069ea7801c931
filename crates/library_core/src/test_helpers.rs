//! Test helpers for common test setup and utilities.
//!
//! Shared configurations and world builders so unit tests, integration tests and
//! benchmarks agree on their fixtures.

use bevy_ecs::prelude::World;

use crate::config::LibraryConfig;
use crate::runner::initialize_simulation;
use crate::scenario::build_scenario;

/// Seed used by fixtures that need a reproducible stream.
pub const TEST_SEED: u64 = 42;

/// Default library settings with [TEST_SEED].
pub fn seeded_config() -> LibraryConfig {
    LibraryConfig::default().with_seed(TEST_SEED)
}

/// Everyone requests a book; 20 minute horizon with arrivals every 4 minutes.
pub fn requests_only_config() -> LibraryConfig {
    seeded_config()
        .with_horizon(20.0)
        .with_inter_arrival(4.0)
        .with_actions(1.0, 0.0, 0.0)
        .with_employees(2)
        .with_capacity(20)
}

/// A single desk with room for a single person.
pub fn single_seat_config() -> LibraryConfig {
    seeded_config().with_employees(1).with_capacity(1)
}

/// A world with all engine resources and the initial row in place.
pub fn create_test_world(config: LibraryConfig) -> World {
    let mut world = World::new();
    build_scenario(&mut world, config);
    initialize_simulation(&mut world);
    world
}

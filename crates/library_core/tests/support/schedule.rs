#![allow(dead_code)]

use bevy_ecs::prelude::World;
use bevy_ecs::schedule::Schedule;
use library_core::clock::EventKind;
use library_core::runner::{run_next_event, run_until_stopped, simulation_schedule, RunStatus};

/// Helper that owns a reusable `Schedule` so tests can step or drain the event queue.
pub struct ScheduleRunner {
    schedule: Schedule,
}

impl Default for ScheduleRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleRunner {
    /// Create a runner with the default simulation schedule.
    pub fn new() -> Self {
        Self {
            schedule: simulation_schedule(),
        }
    }

    /// Run a single event, returning its kind.
    pub fn run_one(&mut self, world: &mut World) -> Option<EventKind> {
        run_next_event(world, &mut self.schedule)
    }

    /// Run until the simulation stops or `max_events` have been processed.
    pub fn run_until_stopped(&mut self, world: &mut World, max_events: usize) -> (RunStatus, usize) {
        run_until_stopped(world, &mut self.schedule, max_events)
    }

    pub fn run_full(&mut self, world: &mut World) -> (RunStatus, usize) {
        self.run_until_stopped(world, usize::MAX)
    }
}

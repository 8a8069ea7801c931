//! Simulation runner: advances the clock and routes events into the ECS.
//!
//! Clock progression, closed-time accrual and event routing happen here, outside
//! systems. Each step pops the next event from [SimulationClock], inserts it as
//! [CurrentEvent], then runs the schedule.

use bevy_ecs::prelude::{Res, Schedule, World};
use bevy_ecs::schedule::{apply_deferred, IntoSystemConfigs};
use serde::Serialize;
use tracing::debug;

use crate::clock::{CurrentEvent, EventKind, EventPayload, SimulationClock};
use crate::config::LibraryConfig;
use crate::library::Library;
use crate::systems::{
    arrival::arrival_system, dispatch::dispatch_service_system,
    reading_end::reading_end_system, service_end::service_end_system,
    snapshot::capture_snapshot_system,
};
use crate::telemetry::{Counters, StepVariates};

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RunStatus {
    /// The `SimulationEnd` event was processed.
    Completed,
    /// The iteration cap was reached before `SimulationEnd`.
    IterationCapReached,
    /// The event list ran dry before `SimulationEnd`.
    QueueExhausted,
}

fn is_arrival(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind() == EventKind::Arrival)
        .unwrap_or(false)
}

fn is_service_end(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind() == EventKind::ServiceEnd)
        .unwrap_or(false)
}

fn is_reading_end(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind() == EventKind::ReadingEnd)
        .unwrap_or(false)
}

/// Runs one simulation step and returns the kind of the processed event, or `None`
/// if the clock was empty.
pub fn run_next_event(world: &mut World, schedule: &mut Schedule) -> Option<EventKind> {
    let previous = world.resource::<SimulationClock>().now();
    let event = world.resource_mut::<SimulationClock>().pop_next()?;

    // Closure status only changes inside handlers, so it held for the whole interval.
    if world.resource::<Library>().is_closed() {
        world.resource_mut::<Counters>().closed_time_total += event.timestamp - previous;
    }
    world.resource_mut::<StepVariates>().clear();
    world.insert_resource(CurrentEvent(event));

    debug!(
        sequence = event.sequence,
        kind = event.kind().label(),
        clock = event.timestamp,
        "processing event"
    );
    schedule.run(world);
    Some(event.kind())
}

/// Processes events until `SimulationEnd`, an empty clock, or `max_events` processed
/// events. Returns the stop reason and the number of events processed.
pub fn run_until_stopped(
    world: &mut World,
    schedule: &mut Schedule,
    max_events: usize,
) -> (RunStatus, usize) {
    let mut processed = 0;
    loop {
        if processed >= max_events {
            return (RunStatus::IterationCapReached, processed);
        }
        match run_next_event(world, schedule) {
            None => return (RunStatus::QueueExhausted, processed),
            Some(EventKind::SimulationEnd) => return (RunStatus::Completed, processed + 1),
            Some(_) => processed += 1,
        }
    }
}

/// Builds the simulation schedule: the handler for the current event kind, then
/// service dispatch, then the snapshot.
///
/// The [apply_deferred] steps make spawned and despawned people visible to the
/// systems that follow. `SimulationEnd` has no handler; it only produces a row.
pub fn simulation_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            (
                arrival_system.run_if(is_arrival),
                service_end_system.run_if(is_service_end),
                reading_end_system.run_if(is_reading_end),
            ),
            apply_deferred,
            dispatch_service_system,
            apply_deferred,
            capture_snapshot_system,
        )
            .chain(),
    );
    schedule
}

/// Schedules the first arrival and the terminal `SimulationEnd`, then records the
/// initial row. Call this after [crate::scenario::build_scenario].
pub fn initialize_simulation(world: &mut World) {
    let (inter_arrival, horizon) = {
        let config = world.resource::<LibraryConfig>();
        (config.inter_arrival, config.horizon)
    };
    {
        let mut clock = world.resource_mut::<SimulationClock>();
        if inter_arrival <= horizon {
            clock.schedule_at(inter_arrival, EventPayload::Arrival);
        }
        clock.schedule_at(horizon, EventPayload::SimulationEnd);
    }

    let mut initial = Schedule::default();
    initial.add_systems(capture_snapshot_system);
    initial.run(world);
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::scenario::build_scenario;
    use crate::snapshot::SnapshotLog;

    fn initialized(config: LibraryConfig) -> World {
        let mut world = World::new();
        build_scenario(&mut world, config);
        initialize_simulation(&mut world);
        world
    }

    #[test]
    fn initialization_schedules_first_arrival_and_end() {
        let world = initialized(LibraryConfig::default());
        let clock = world.resource::<SimulationClock>();
        let pending: Vec<(EventKind, f64)> = clock
            .peek_next(5)
            .iter()
            .map(|event| (event.kind(), event.timestamp))
            .collect();
        assert_eq!(
            pending,
            vec![(EventKind::Arrival, 4.0), (EventKind::SimulationEnd, 480.0)]
        );
        assert_eq!(world.resource::<SnapshotLog>().len(), 1);
    }

    #[test]
    fn first_arrival_beyond_horizon_is_not_scheduled() {
        let world = initialized(LibraryConfig::default().with_horizon(3.0));
        let clock = world.resource::<SimulationClock>();
        assert_eq!(clock.len(), 1);
        assert_eq!(clock.next_event_time(), Some(3.0));
    }

    #[test]
    fn one_step_adds_one_row() {
        let mut world = initialized(LibraryConfig::default().with_seed(10));
        let mut schedule = simulation_schedule();
        assert_eq!(
            run_next_event(&mut world, &mut schedule),
            Some(EventKind::Arrival)
        );
        let log = world.resource::<SnapshotLog>();
        assert_eq!(log.len(), 2);
        let row = log.last().expect("row");
        assert_eq!(row.sequence, 1);
        assert_eq!(row.event, Some(EventKind::Arrival));
        assert_eq!(row.clock, 4.0);
        // The first arrival finds a free employee and is served straight away.
        assert_eq!(row.library.being_served_count(), 1);
        assert!(row.library.queue.is_empty());
    }

    #[test]
    fn cap_stops_before_simulation_end() {
        let mut world = initialized(LibraryConfig::default().with_seed(11));
        let mut schedule = simulation_schedule();
        let (status, processed) = run_until_stopped(&mut world, &mut schedule, 3);
        assert_eq!(status, RunStatus::IterationCapReached);
        assert_eq!(processed, 3);
        assert_eq!(world.resource::<SnapshotLog>().len(), 4);
    }

    #[test]
    fn empty_clock_reports_exhaustion() {
        let mut world = World::new();
        build_scenario(&mut world, LibraryConfig::default());
        let mut schedule = simulation_schedule();
        assert_eq!(
            run_until_stopped(&mut world, &mut schedule, 10),
            (RunStatus::QueueExhausted, 0)
        );
    }

    #[test]
    fn closed_time_accrues_between_events() {
        let mut world = initialized(LibraryConfig::default().with_seed(12).with_capacity(1));
        let mut schedule = simulation_schedule();
        // Arrival at 4 fills the library; the next event's interval counts as closed.
        run_next_event(&mut world, &mut schedule);
        assert!(world.resource::<Library>().is_closed());
        let before = world.resource::<SimulationClock>().now();
        run_next_event(&mut world, &mut schedule);
        let after = world.resource::<SimulationClock>().now();
        let closed = world.resource::<Counters>().closed_time_total;
        assert!((closed - (after - before)).abs() < 1e-12);
        assert!(closed > 0.0);
    }
}

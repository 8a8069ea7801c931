use std::collections::BTreeMap;

use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::{CurrentEvent, SimulationClock};
use crate::config::LibraryConfig;
use crate::ecs::{Person, ReadingProgress};
use crate::library::Library;
use crate::snapshot::{
    EmployeeSnapshot, LibrarySnapshot, PersonSnapshot, SnapshotLog, SnapshotRow, UpcomingEvent,
};
use crate::telemetry::{Counters, StepVariates};

fn library_snapshot(library: &Library) -> LibrarySnapshot {
    LibrarySnapshot {
        employees: library
            .employees()
            .iter()
            .map(|employee| EmployeeSnapshot {
                id: employee.id(),
                state: employee.state(),
                serving: employee.serving(),
                service_ends_at: employee.service_ends_at(),
            })
            .collect(),
        queue: library.queued().collect(),
        reading: library.reading().collect(),
        persons_inside: library.persons_inside(),
        capacity: library.capacity(),
        closed: library.is_closed(),
    }
}

/// Appends one row describing the state after the current event.
///
/// Without a [CurrentEvent] the row is labelled as the initial state.
#[allow(clippy::too_many_arguments)]
pub fn capture_snapshot_system(
    event: Option<Res<CurrentEvent>>,
    clock: Res<SimulationClock>,
    config: Res<LibraryConfig>,
    library: Res<Library>,
    counters: Res<Counters>,
    variates: Res<StepVariates>,
    persons: Query<(&Person, Option<&ReadingProgress>)>,
    mut log: ResMut<SnapshotLog>,
) {
    let mut integrations = BTreeMap::new();
    let mut people = BTreeMap::new();
    for (person, progress) in persons.iter() {
        if let Some(progress) = progress {
            integrations.insert(person.id(), progress.integrator.clone());
        }
        people.insert(
            person.id(),
            PersonSnapshot {
                id: person.id(),
                action: person.action(),
                state: person.state(),
                arrived_at: person.arrived_at(),
                service_ends_at: person.service_ended_at(),
                reading_ends_at: progress.map(|progress| progress.ends_at),
                book_pages: person.book().map(|book| book.pages()),
                pages_read: progress.map(|progress| progress.integrator.value()),
                variates: *person.variates(),
            },
        );
    }

    let upcoming = clock
        .peek_next(config.upcoming_events_shown)
        .into_iter()
        .map(|event| UpcomingEvent {
            kind: event.kind(),
            timestamp: event.timestamp,
        })
        .collect();

    let sequence = log.len() as u64;
    log.rows.push(SnapshotRow {
        sequence,
        clock: clock.now(),
        event: event.map(|event| event.0.kind()),
        upcoming,
        library: library_snapshot(&library),
        counters: counters.clone(),
        variates: variates.0.clone(),
        integrations,
        persons: people,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};

    use crate::clock::{EventKind, EventPayload};
    use crate::distributions::VariateDraw;
    use crate::ecs::{ActionKind, PersonState};
    use crate::scenario::build_scenario;
    use crate::telemetry::VariateSlot;

    fn capture(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems(capture_snapshot_system);
        schedule.run(world);
    }

    #[test]
    fn initial_row_has_no_event_and_lists_pending() {
        let mut world = World::new();
        build_scenario(&mut world, LibraryConfig::default().with_upcoming_events_shown(1));
        {
            let mut clock = world.resource_mut::<SimulationClock>();
            clock.schedule_at(480.0, EventPayload::SimulationEnd);
            clock.schedule_at(4.0, EventPayload::Arrival);
        }

        capture(&mut world);

        let log = world.resource::<SnapshotLog>();
        let row = log.last().expect("row");
        assert_eq!(row.sequence, 0);
        assert_eq!(row.event, None);
        assert_eq!(row.clock, 0.0);
        assert_eq!(
            row.upcoming,
            vec![UpcomingEvent {
                kind: EventKind::Arrival,
                timestamp: 4.0
            }]
        );
        assert_eq!(row.library.employees.len(), 2);
        assert!(row.persons.is_empty());
        assert!(row.integrations.is_empty());
    }

    #[test]
    fn rows_copy_state_instead_of_sharing_it() {
        let mut world = World::new();
        build_scenario(&mut world, LibraryConfig::default());
        let draw = VariateDraw {
            raw: 0.3,
            value: 0.3,
        };
        let id = world.resource_mut::<Library>().allocate_person_id();
        let entity = world
            .spawn(Person::arrive(id, ActionKind::Inquire, 0.0, draw))
            .id();
        world.resource_mut::<Library>().admit(entity, id);
        world.resource_mut::<Counters>().record_arrival(ActionKind::Inquire);
        world
            .resource_mut::<StepVariates>()
            .record(VariateSlot::ActionKind, draw);

        capture(&mut world);
        world.resource_mut::<Counters>().record_arrival(ActionKind::Inquire);
        world.resource_mut::<StepVariates>().clear();
        capture(&mut world);

        let log = world.resource::<SnapshotLog>();
        assert_eq!(log.len(), 2);
        let first = &log.rows[0];
        assert_eq!(first.counters.arrivals, 1);
        assert_eq!(first.variates.get(&VariateSlot::ActionKind), Some(&draw));
        assert_eq!(first.library.queue, vec![id]);
        assert_eq!(first.persons[&id].state, PersonState::Queued);

        let second = &log.rows[1];
        assert_eq!(second.sequence, 1);
        assert_eq!(second.counters.arrivals, 2);
        assert!(second.variates.is_empty());
    }
}

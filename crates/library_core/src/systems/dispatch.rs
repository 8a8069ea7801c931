use bevy_ecs::prelude::{Query, Res, ResMut};
use tracing::{trace, warn};

use crate::clock::{EventPayload, SimulationClock};
use crate::config::LibraryConfig;
use crate::distributions::{VariateDraw, VariateGenerator};
use crate::ecs::{ActionKind, Person};
use crate::library::Library;
use crate::telemetry::{StepVariates, VariateSlot};

/// Draws a service time for the given action.
pub fn draw_service_time(
    generator: &mut VariateGenerator,
    config: &LibraryConfig,
    action: ActionKind,
) -> VariateDraw {
    let service = &config.service;
    match action {
        ActionKind::RequestBook => generator.draw_exponential(service.request_search_mean),
        ActionKind::ReturnBook => generator.draw_uniform(service.return_min, service.return_max),
        ActionKind::Inquire => generator.draw_uniform(service.inquiry_min, service.inquiry_max),
    }
}

/// Pairs free employees (lowest id first) with queued people (front first).
///
/// Runs after every handler, so service starts as soon as both sides are available.
pub fn dispatch_service_system(
    config: Res<LibraryConfig>,
    mut clock: ResMut<SimulationClock>,
    mut generator: ResMut<VariateGenerator>,
    mut library: ResMut<Library>,
    mut variates: ResMut<StepVariates>,
    mut persons: Query<&mut Person>,
) {
    let now = clock.now();
    while library.queue_len() > 0 {
        let Some(employee_id) = library.first_free_employee() else {
            break;
        };
        let Some((entity, person_id)) = library.pop_queue() else {
            break;
        };
        let Ok(mut person) = persons.get_mut(entity) else {
            warn!(person = %person_id, "queued person has no entity, dropping from queue");
            continue;
        };

        let draw = draw_service_time(&mut generator, &config, person.action());
        variates.record(VariateSlot::service_for(person.action()), draw);
        let ends_at = now + draw.value;
        person.begin_service(now, ends_at, draw);
        if let Some(employee) = library.employee_mut(employee_id) {
            employee.assign(entity, person_id, ends_at);
        }
        clock.schedule_at(
            ends_at,
            EventPayload::ServiceEnd {
                employee: employee_id,
                person: entity,
            },
        );
        trace!(person = %person_id, employee = %employee_id, ends_at, "service started");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};

    use crate::clock::EventKind;
    use crate::ecs::{EmployeeId, PersonState};
    use crate::scenario::build_scenario;

    fn queue_person(world: &mut World, action: ActionKind, arrived_at: f64) {
        let id = world.resource_mut::<Library>().allocate_person_id();
        let draw = VariateDraw {
            raw: 0.0,
            value: 0.0,
        };
        let entity = world.spawn(Person::arrive(id, action, arrived_at, draw)).id();
        world.resource_mut::<Library>().admit(entity, id);
    }

    fn run_dispatch(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems(dispatch_service_system);
        schedule.run(world);
    }

    #[test]
    fn free_employees_take_queue_in_order() {
        let mut world = World::new();
        build_scenario(&mut world, LibraryConfig::default().with_seed(4).with_employees(2));
        for action in [ActionKind::ReturnBook, ActionKind::Inquire, ActionKind::RequestBook] {
            queue_person(&mut world, action, 0.0);
        }

        run_dispatch(&mut world);

        let library = world.resource::<Library>();
        assert_eq!(library.queue_len(), 1);
        assert_eq!(library.queued().next().map(|id| id.0), Some(3));
        let first = library.employee(EmployeeId(0)).expect("employee 1");
        let second = library.employee(EmployeeId(1)).expect("employee 2");
        assert_eq!(first.serving().map(|id| id.0), Some(1));
        assert_eq!(second.serving().map(|id| id.0), Some(2));

        let return_end = first.service_ends_at().expect("return end");
        assert!((2.0..3.5).contains(&return_end));
        let inquiry_end = second.service_ends_at().expect("inquiry end");
        assert!((2.0..5.0).contains(&inquiry_end));

        let clock = world.resource::<SimulationClock>();
        assert_eq!(clock.len(), 2);
        assert!(clock
            .peek_next(2)
            .iter()
            .all(|event| event.kind() == EventKind::ServiceEnd));

        let variates = world.resource::<StepVariates>();
        assert!(variates.0.contains_key(&VariateSlot::ReturnService));
        assert!(variates.0.contains_key(&VariateSlot::InquiryService));

        let served = world
            .query::<&Person>()
            .iter(&world)
            .filter(|person| person.state() == PersonState::BeingServed)
            .count();
        assert_eq!(served, 2);
    }

    #[test]
    fn no_dispatch_while_everyone_is_busy() {
        let mut world = World::new();
        build_scenario(&mut world, LibraryConfig::default().with_seed(5).with_employees(1));
        queue_person(&mut world, ActionKind::Inquire, 0.0);
        run_dispatch(&mut world);
        queue_person(&mut world, ActionKind::Inquire, 1.0);
        world.resource_mut::<StepVariates>().clear();
        run_dispatch(&mut world);

        let library = world.resource::<Library>();
        assert_eq!(library.queue_len(), 1);
        assert_eq!(library.being_served_count(), 1);
        assert!(world.resource::<StepVariates>().0.is_empty());
    }
}

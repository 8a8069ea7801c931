use bevy_ecs::prelude::{Commands, Res, ResMut};
use tracing::trace;

use crate::clock::{CurrentEvent, EventKind, EventPayload, SimulationClock};
use crate::config::{ActionProbabilities, LibraryConfig};
use crate::distributions::VariateGenerator;
use crate::ecs::{ActionKind, Person};
use crate::library::Library;
use crate::telemetry::{Counters, LibraryTelemetry, RejectedArrival, StepVariates, VariateSlot};

/// Maps a uniform draw onto the configured action probabilities.
pub fn choose_action(probabilities: &ActionProbabilities, u: f64) -> ActionKind {
    if u < probabilities.request {
        ActionKind::RequestBook
    } else if u < probabilities.request + probabilities.return_book {
        ActionKind::ReturnBook
    } else {
        ActionKind::Inquire
    }
}

#[allow(clippy::too_many_arguments)]
pub fn arrival_system(
    mut commands: Commands,
    event: Res<CurrentEvent>,
    config: Res<LibraryConfig>,
    mut clock: ResMut<SimulationClock>,
    mut generator: ResMut<VariateGenerator>,
    mut library: ResMut<Library>,
    mut counters: ResMut<Counters>,
    mut variates: ResMut<StepVariates>,
    mut telemetry: ResMut<LibraryTelemetry>,
) {
    if event.0.kind() != EventKind::Arrival {
        return;
    }
    let now = clock.now();

    let draw = generator.draw_uniform(0.0, 1.0);
    variates.record(VariateSlot::ActionKind, draw);
    let action = choose_action(&config.actions, draw.raw);
    let id = library.allocate_person_id();
    counters.record_arrival(action);

    if library.is_closed() {
        counters.rejections += 1;
        telemetry.rejected.push(RejectedArrival {
            person: id,
            action,
            at: now,
        });
        trace!(person = %id, ?action, now, "arrival rejected, library is full");
    } else {
        let entity = commands.spawn(Person::arrive(id, action, now, draw)).id();
        library.admit(entity, id);
        trace!(person = %id, ?action, now, queue = library.queue_len(), "person queued");
    }

    let next = now + config.inter_arrival;
    if next <= config.horizon {
        clock.schedule_at(next, EventPayload::Arrival);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};
    use bevy_ecs::schedule::{apply_deferred, IntoSystemConfigs};

    use crate::ecs::PersonState;
    use crate::scenario::build_scenario;

    fn world_with(config: LibraryConfig) -> World {
        let mut world = World::new();
        build_scenario(&mut world, config);
        world
    }

    fn run_arrival_at(world: &mut World, timestamp: f64) {
        world
            .resource_mut::<SimulationClock>()
            .schedule_at(timestamp, EventPayload::Arrival);
        let event = world
            .resource_mut::<SimulationClock>()
            .pop_next()
            .expect("arrival event");
        world.insert_resource(CurrentEvent(event));

        let mut schedule = Schedule::default();
        schedule.add_systems((arrival_system, apply_deferred).chain());
        schedule.run(world);
    }

    #[test]
    fn action_thresholds_are_cumulative() {
        let probabilities = ActionProbabilities::new(0.45, 0.45, 0.10);
        assert_eq!(choose_action(&probabilities, 0.0), ActionKind::RequestBook);
        assert_eq!(choose_action(&probabilities, 0.449), ActionKind::RequestBook);
        assert_eq!(choose_action(&probabilities, 0.45), ActionKind::ReturnBook);
        assert_eq!(choose_action(&probabilities, 0.899), ActionKind::ReturnBook);
        assert_eq!(choose_action(&probabilities, 0.9), ActionKind::Inquire);

        let requests_only = ActionProbabilities::new(1.0, 0.0, 0.0);
        assert_eq!(choose_action(&requests_only, 0.999_999), ActionKind::RequestBook);
    }

    #[test]
    fn arrival_queues_person_and_schedules_next() {
        let mut world = world_with(LibraryConfig::default().with_seed(1));
        run_arrival_at(&mut world, 4.0);

        let library = world.resource::<Library>();
        assert_eq!(library.persons_inside(), 1);
        assert_eq!(library.queue_len(), 1);

        let person = world.query::<&Person>().single(&world);
        assert_eq!(person.state(), PersonState::Queued);
        assert_eq!(person.arrived_at(), 4.0);

        let counters = world.resource::<Counters>();
        assert_eq!(counters.arrivals, 1);
        assert_eq!(counters.rejections, 0);

        assert!(world
            .resource::<StepVariates>()
            .0
            .contains_key(&VariateSlot::ActionKind));
        assert_eq!(world.resource::<SimulationClock>().next_event_time(), Some(8.0));
    }

    #[test]
    fn arrival_when_full_is_rejected() {
        let mut world = world_with(LibraryConfig::default().with_seed(2).with_capacity(1));
        run_arrival_at(&mut world, 4.0);
        world.resource_mut::<StepVariates>().clear();
        run_arrival_at(&mut world, 8.0);

        let library = world.resource::<Library>();
        assert_eq!(library.persons_inside(), 1);
        assert!(library.is_closed());
        assert_eq!(world.query::<&Person>().iter(&world).count(), 1);

        let counters = world.resource::<Counters>();
        assert_eq!(counters.arrivals, 2);
        assert_eq!(counters.rejections, 1);

        let telemetry = world.resource::<LibraryTelemetry>();
        assert_eq!(telemetry.rejected.len(), 1);
        assert_eq!(telemetry.rejected[0].at, 8.0);
    }

    #[test]
    fn no_arrival_scheduled_past_horizon() {
        let mut world = world_with(LibraryConfig::default().with_seed(3).with_horizon(10.0));
        run_arrival_at(&mut world, 8.0);
        assert!(world.resource::<SimulationClock>().is_empty());
    }
}

use bevy_ecs::prelude::{Commands, Query, Res, ResMut};
use tracing::{trace, warn};

use crate::clock::{CurrentEvent, EventPayload, SimulationClock};
use crate::config::LibraryConfig;
use crate::distributions::VariateGenerator;
use crate::ecs::{ActionKind, Book, Person, ReadingProgress};
use crate::integrator::{reading_duration, EulerIntegrator};
use crate::library::Library;
use crate::systems::depart_person;
use crate::telemetry::{Counters, LibraryTelemetry, StepVariates, VariateSlot};

#[allow(clippy::too_many_arguments)]
pub fn service_end_system(
    mut commands: Commands,
    event: Res<CurrentEvent>,
    config: Res<LibraryConfig>,
    mut clock: ResMut<SimulationClock>,
    mut generator: ResMut<VariateGenerator>,
    mut library: ResMut<Library>,
    mut counters: ResMut<Counters>,
    mut variates: ResMut<StepVariates>,
    mut telemetry: ResMut<LibraryTelemetry>,
    mut persons: Query<&mut Person>,
) {
    let EventPayload::ServiceEnd {
        employee: employee_id,
        person: entity,
    } = event.0.payload
    else {
        return;
    };
    let now = clock.now();

    let Some(employee) = library.employee_mut(employee_id) else {
        warn!(employee = %employee_id, "service end for unknown employee");
        return;
    };
    let served = employee.release();
    debug_assert_eq!(served, Some(entity), "employee was serving someone else");

    let Ok(mut person) = persons.get_mut(entity) else {
        warn!(employee = %employee_id, "service end for a person no longer present");
        return;
    };

    if person.action() != ActionKind::RequestBook {
        depart_person(
            now,
            entity,
            &mut person,
            None,
            &mut library,
            &mut counters,
            &mut telemetry,
        );
        commands.entity(entity).despawn();
        return;
    }

    let pages_draw =
        generator.draw_uniform_discrete(config.pages.min as i64, config.pages.max as i64);
    variates.record(VariateSlot::PageCount, pages_draw);
    let pages = pages_draw.value as u32;
    let book = Book::new(library.allocate_book_id(), pages, &config.tiers);

    let stay_draw = generator.draw_uniform(0.0, 1.0);
    variates.record(VariateSlot::StayDecision, stay_draw);
    person.receive_book(book, pages_draw, stay_draw);

    if stay_draw.raw < config.leave_probability {
        trace!(person = %person.id(), pages, "left with the book");
        depart_person(
            now,
            entity,
            &mut person,
            None,
            &mut library,
            &mut counters,
            &mut telemetry,
        );
        commands.entity(entity).despawn();
        return;
    }

    let mut integrator = EulerIntegrator::new(config.reading.step_size, book.k(), 0.0);
    let duration = reading_duration(&mut integrator, pages as f64, config.reading.macro_step);
    let ends_at = now + duration;
    person.start_reading();
    library.start_reading(entity, person.id());
    commands.entity(entity).insert(ReadingProgress {
        integrator,
        started_at: now,
        ends_at,
    });
    clock.schedule_at(ends_at, EventPayload::ReadingEnd { person: entity });
    trace!(person = %person.id(), pages, k = book.k(), ends_at, "stayed to read");
}

pub mod arrival;
pub mod dispatch;
pub mod reading_end;
pub mod service_end;
pub mod snapshot;

use bevy_ecs::prelude::Entity;
use tracing::trace;

use crate::ecs::Person;
use crate::integrator::EulerIntegrator;
use crate::library::Library;
use crate::telemetry::{Counters, DepartureRecord, LibraryTelemetry};

/// Takes a person out of the library and records the departure.
///
/// The caller despawns the entity.
pub(crate) fn depart_person(
    now: f64,
    entity: Entity,
    person: &mut Person,
    reading: Option<EulerIntegrator>,
    library: &mut Library,
    counters: &mut Counters,
    telemetry: &mut LibraryTelemetry,
) {
    let residence = person.depart(now);
    counters.record_departure(residence);
    telemetry
        .departures
        .push(DepartureRecord::from_person(person, now, reading));
    let was_inside = library.depart(entity);
    debug_assert!(was_inside, "departing person {} was not inside", person.id());
    trace!(person = %person.id(), residence, "person departed");
}

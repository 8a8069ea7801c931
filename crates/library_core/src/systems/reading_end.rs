use bevy_ecs::prelude::{Commands, Query, Res, ResMut};
use tracing::warn;

use crate::clock::{CurrentEvent, EventPayload, SimulationClock};
use crate::ecs::{Person, ReadingProgress};
use crate::library::Library;
use crate::systems::depart_person;
use crate::telemetry::{Counters, LibraryTelemetry};

pub fn reading_end_system(
    mut commands: Commands,
    event: Res<CurrentEvent>,
    clock: Res<SimulationClock>,
    mut library: ResMut<Library>,
    mut counters: ResMut<Counters>,
    mut telemetry: ResMut<LibraryTelemetry>,
    mut readers: Query<(&mut Person, Option<&ReadingProgress>)>,
) {
    let EventPayload::ReadingEnd { person: entity } = event.0.payload else {
        return;
    };
    let Ok((mut person, progress)) = readers.get_mut(entity) else {
        warn!("reading end for a person no longer present");
        return;
    };

    let integrator = progress.map(|progress| progress.integrator.clone());
    depart_person(
        clock.now(),
        entity,
        &mut person,
        integrator,
        &mut library,
        &mut counters,
        &mut telemetry,
    );
    commands.entity(entity).despawn();
}
